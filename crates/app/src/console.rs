//! Line-oriented terminal front end over `QuizEngine` snapshots.

use chrono::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use exam_core::model::{LabelError, LabelSet, OptionLabel, STANDARD_QUESTION_COUNTS, SessionSummary};
use services::{
    HistoryStats, Page, QuestionView, QuizEngine, QuizRequest, QuizSnapshot, SessionError,
    SessionPhase,
};

/// What a line of input means on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Continue,
    Quit,
    Pause,
    Resume,
    Discard,
    Start(usize),
    Answer(LabelSet),
    Invalid(String),
}

pub async fn run(
    engine: &mut QuizEngine,
    request: QuizRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut request = request;

    loop {
        let snapshot = engine.snapshot().await?;
        render(&snapshot, engine.settings().pass_threshold_percent(), request.count);

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let outcome = match read_input(snapshot.phase, &line) {
            Input::Quit => return Ok(()),
            Input::Invalid(message) => {
                println!("{message}");
                continue;
            }
            Input::Start(count) => {
                request.count = count;
                engine.start_quiz(request).await.map(drop)
            }
            Input::Continue => match snapshot.phase {
                SessionPhase::Reviewing => engine.advance_current().await.map(drop),
                _ => engine.start_quiz(request).await.map(drop),
            },
            Input::Pause => engine.pause().await,
            Input::Resume => engine.resume().await,
            Input::Discard => engine.abandon(),
            Input::Answer(chosen) => engine.submit_answer(chosen).await.map(drop),
        };

        match outcome {
            Ok(()) => {}
            Err(
                err @ (SessionError::InvalidSelectionCount { .. }
                | SessionError::UnknownOption(_)
                | SessionError::InvalidTransition { .. }
                | SessionError::QuestionMismatch { .. }
                | SessionError::Empty),
            ) => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_input(phase: SessionPhase, line: &str) -> Input {
    let line = line.trim();
    match (phase, line.to_ascii_lowercase().as_str()) {
        (_, "q" | "quit") => Input::Quit,
        (SessionPhase::Answering | SessionPhase::Reviewing, "p" | "pause") => Input::Pause,
        (SessionPhase::Paused, "r" | "resume") => Input::Resume,
        (SessionPhase::Paused, "d" | "discard") => Input::Discard,
        (SessionPhase::Paused, _) => Input::Invalid("type r to resume or d to discard".into()),
        (SessionPhase::Reviewing, "") => Input::Continue,
        (SessionPhase::Reviewing, _) => Input::Invalid("press Enter for the next question".into()),
        (SessionPhase::Answering, _) => match parse_choice(line) {
            Ok(chosen) => Input::Answer(chosen),
            Err(err) => Input::Invalid(format!("{err}; answer like `b` or `a&c`")),
        },
        (SessionPhase::NotStarted | SessionPhase::Completed, "") => Input::Continue,
        (SessionPhase::NotStarted | SessionPhase::Completed, choice) => choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| STANDARD_QUESTION_COUNTS.get(i))
            .and_then(|count| usize::try_from(*count).ok())
            .map_or_else(|| Input::Invalid("unknown choice".into()), Input::Start),
    }
}

/// Parse an answer typed as `a&c`, `ac`, `a c` or `a, c`.
fn parse_choice(raw: &str) -> Result<LabelSet, LabelError> {
    if raw.contains('&') {
        return raw.parse();
    }
    let labels = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(OptionLabel::try_from)
        .collect::<Result<LabelSet, _>>()?;
    if labels.is_empty() {
        return Err(LabelError::Empty);
    }
    Ok(labels)
}

fn render(snapshot: &QuizSnapshot, pass_threshold: u8, next_count: usize) {
    println!();
    match snapshot.page {
        Page::Home if snapshot.phase == SessionPhase::Paused => {
            if let Some(progress) = &snapshot.progress {
                println!(
                    "Paused at question {} of {}.",
                    progress.current + 1,
                    progress.total
                );
            }
            if let Some(remaining) = snapshot.remaining {
                println!("Time left: {}", format_duration(remaining));
            }
            println!("[r] resume  [d] discard  [q] quit");
        }
        Page::Home => {
            render_stats(&snapshot.stats);
            render_start_prompt(next_count);
        }
        Page::Quiz => {
            if let Some(question) = &snapshot.question {
                render_question(question, snapshot.remaining);
            }
        }
        Page::Results => {
            if let Some(summary) = &snapshot.last_summary {
                render_summary(summary, pass_threshold);
            }
            render_stats(&snapshot.stats);
            render_start_prompt(next_count);
        }
    }
}

fn render_start_prompt(next_count: usize) {
    let standard = STANDARD_QUESTION_COUNTS
        .iter()
        .enumerate()
        .map(|(i, count)| format!("[{}] {count} questions", i + 1))
        .collect::<Vec<_>>()
        .join("  ");
    println!("[Enter] start {next_count} questions  {standard}  [q] quit");
}

fn render_question(question: &QuestionView, remaining: Option<Duration>) {
    let remaining =
        remaining.map_or_else(String::new, |r| format!("  ({} left)", format_duration(r)));
    println!(
        "Question {}/{} [{}]{remaining}",
        question.index + 1,
        question.total,
        question.category
    );
    println!("{}", question.question);
    for option in &question.options {
        println!("  {}. {}", option.label, option.text);
    }

    match (&question.correct, question.was_correct) {
        (Some(correct), Some(was_correct)) => {
            let verdict = if was_correct { "Correct" } else { "Incorrect" };
            println!("{verdict}. Answer: {correct}");
            if let Some(explanation) = question.explanation.as_deref().filter(|e| !e.is_empty()) {
                println!("{explanation}");
            }
            println!("[Enter] next  [p] pause  [q] quit");
        }
        _ => {
            let hint = if question.required_selections > 1 {
                format!("choose {} options, e.g. a&c", question.required_selections)
            } else {
                "choose one option".to_string()
            };
            println!("Answer ({hint})  [p] pause  [q] quit");
        }
    }
}

fn render_summary(summary: &SessionSummary, pass_threshold: u8) {
    println!(
        "Score: {}/{} ({:.1}%)",
        summary.correct(),
        summary.total(),
        summary.accuracy()
    );
    if summary.passed(pass_threshold) {
        println!("Passed ({pass_threshold}% needed).");
    } else {
        println!(
            "Not passed: {} more correct answer(s) needed.",
            summary.correct_needed_to_pass(pass_threshold)
        );
    }
    let timed_out = if summary.timed_out() { " (time ran out)" } else { "" };
    println!(
        "Time: {} of {}{timed_out}",
        format_duration(summary.time_spent()),
        format_duration(summary.time_limit())
    );
    if let Some(average) = summary.average_answer_time() {
        println!("Average per question: {}", format_duration(average));
    }
}

fn render_stats(stats: &HistoryStats) {
    if stats.total_answered == 0 {
        return;
    }
    println!("Answered so far: {}", stats.total_answered);
    for (category, accuracy) in &stats.accuracy_by_category {
        let count = stats.count_by_category.get(category).copied().unwrap_or(0);
        println!("  {:<11} {accuracy:>5.1}% of {count}", category.as_str());
    }
    if !stats.recent_mistakes.is_empty() {
        println!("Recent mistakes:");
        for mistake in &stats.recent_mistakes {
            println!("  [{}] {}", mistake.category, mistake.question_text);
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
