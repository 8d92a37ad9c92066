use anyhow::{Context, Result};
use dialoguer::{Select, theme::ColorfulTheme};

use crate::llm::quiz::QuizItem;
use crate::llm::{ClientConfig, generate_quiz};
use crate::palette::Palette;
use crate::store::LocalStore;
use crate::utils::pluralize_with;

use super::{ai_client, extracted_text};

pub async fn run(
    store: &LocalStore,
    config: ClientConfig,
    num_questions: usize,
    json: bool,
) -> Result<()> {
    let text = extracted_text(store)?;
    let client = ai_client(store, config)?;

    if !json {
        println!("{}", Palette::dim("Generating quiz questions..."));
    }
    let outcome = generate_quiz(&client, &text, num_questions)
        .await
        .context("Error generating quiz")?;

    if outcome.is_recovered() {
        eprintln!(
            "{}",
            Palette::paint(
                Palette::WARNING,
                "The model did not return a valid quiz; showing its raw reply instead."
            )
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(outcome.items())?);
        return Ok(());
    }

    let items = outcome.into_items();
    let score = take_quiz(&items)?;
    println!(
        "\nYou answered {} of {} correctly.",
        Palette::paint(Palette::SUCCESS, score),
        pluralize_with("question", items.len(), |n| Palette::paint(
            Palette::WARNING,
            n
        ))
    );
    Ok(())
}

fn take_quiz(items: &[QuizItem]) -> Result<usize> {
    let mut score = 0;
    for (idx, item) in items.iter().enumerate() {
        println!(
            "\n{}",
            Palette::bold(format!("Question {}: {}", idx + 1, item.question))
        );
        if item.options.is_empty() {
            println!("{}", Palette::dim("No options available"));
            continue;
        }

        let labels: Vec<String> = item
            .options
            .iter()
            .enumerate()
            .map(|(opt_idx, option)| format!("{}. {}", option_letter(opt_idx), option))
            .collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .items(&labels)
            .default(0)
            .interact()?;

        if grade(item, choice) {
            score += 1;
            println!("{}", Palette::paint(Palette::SUCCESS, "✅ Correct!"));
        } else {
            println!("{}", Palette::paint(Palette::DANGER, "❌ Not quite."));
        }
        println!("{}", answer_line(item));
        if !item.explanation.is_empty() {
            println!("{}", Palette::dim(format!("💡 {}", item.explanation)));
        }
    }
    Ok(score)
}

fn grade(item: &QuizItem, choice: usize) -> bool {
    item.correct_index() == Some(choice)
}

fn answer_line(item: &QuizItem) -> String {
    match item.correct_index().zip(item.correct_option()) {
        Some((idx, option)) => format!("Correct Answer: {}. {}", option_letter(idx), option),
        None => "Answer not available".to_string(),
    }
}

fn option_letter(idx: usize) -> char {
    u8::try_from(idx)
        .ok()
        .and_then(|offset| b'A'.checked_add(offset))
        .map(char::from)
        .filter(char::is_ascii_uppercase)
        .unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(correct: Option<i64>) -> QuizItem {
        QuizItem {
            question: "Which planet is closest to the sun?".into(),
            options: vec![
                "Venus".into(),
                "Mercury".into(),
                "Earth".into(),
                "Mars".into(),
            ],
            correct,
            explanation: "Mercury orbits closest.".into(),
        }
    }

    #[test]
    fn grades_against_correct_index() {
        assert!(grade(&item(Some(1)), 1));
        assert!(!grade(&item(Some(1)), 0));
    }

    #[test]
    fn broken_answer_index_never_scores() {
        assert!(!grade(&item(Some(9)), 9));
        assert!(!grade(&item(Some(-1)), 0));
        assert_eq!(answer_line(&item(Some(9))), "Answer not available");
    }

    #[test]
    fn missing_answer_is_not_available() {
        assert!(!grade(&item(None), 0));
        assert_eq!(answer_line(&item(None)), "Answer not available");
    }

    #[test]
    fn answer_line_uses_letters() {
        assert_eq!(answer_line(&item(Some(1))), "Correct Answer: B. Mercury");
    }

    #[test]
    fn option_letters() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(3), 'D');
        assert_eq!(option_letter(25), 'Z');
        assert_eq!(option_letter(26), '?');
        assert_eq!(option_letter(1000), '?');
    }
}
