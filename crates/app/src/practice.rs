use std::fmt;
use std::io::Write;

use flash_core::model::Level;
use flash_core::reveal::{ExitOutcome, FlashSequencer, RevealEvent, RevealPhase};
use services::{
    AppServices, Clock, FlashSessionService, SaveDecision, SessionError, UserSession,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::warn;

type PracticeResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug)]
pub enum PracticeError {
    /// Input ended or was interrupted while answers still awaited a decision.
    Undecided { unsaved: usize },
}

impl fmt::Display for PracticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PracticeError::Undecided { unsaved } => write!(
                f,
                "input ended before saving or discarding; {unsaved} answers were not saved"
            ),
        }
    }
}

impl std::error::Error for PracticeError {}

enum Input {
    Line(String),
    Closed,
    Interrupted,
}

/// Log a student in and drill one group against the wall clock.
///
/// # Errors
///
/// Returns an error if login fails, the group is unknown, stdin/stdout fail,
/// or input stops while answers are still undecided.
pub async fn run(
    services: &AppServices,
    name: &str,
    classroom: Level,
    group: &str,
) -> PracticeResult {
    let accounts = services.accounts();
    let user = accounts.login_student(name, classroom).await?;
    let result = drill(services, &user, classroom, group).await;
    accounts.logout(user);
    result
}

async fn drill(
    services: &AppServices,
    user: &UserSession,
    classroom: Level,
    group: &str,
) -> PracticeResult {
    let practice = services.practice();
    let mut seq = practice.start(user, classroom, group).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let clock = Clock::system();
    // A line typed before the numbers finished; used as the next answer.
    let mut typed_ahead: Option<String> = None;

    println!(
        "{}: {} questions, type q to stop",
        seq.group().group(),
        seq.group().question_count()
    );

    loop {
        for event in practice.advance(&mut seq) {
            render(&event)?;
        }
        if seq.is_finished() {
            break;
        }

        if seq.phase() == RevealPhase::AwaitingInput {
            let input = match typed_ahead.take() {
                Some(line) => Input::Line(line),
                None => next_input(&mut lines).await?,
            };
            match input {
                Input::Line(line) if !is_quit(&line) => {
                    render(&practice.submit(&mut seq, &line)?)?;
                }
                _ => {
                    stop(&practice, &mut seq);
                    break;
                }
            }
            continue;
        }

        let wait = seq
            .next_deadline()
            .and_then(|deadline| (deadline - clock.now()).to_std().ok())
            .unwrap_or_default();
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            line = lines.next_line(), if typed_ahead.is_none() => match line? {
                Some(line) if !is_quit(&line) => typed_ahead = Some(line),
                _ => {
                    stop(&practice, &mut seq);
                    break;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                stop(&practice, &mut seq);
                break;
            }
        }
    }

    decide(&practice, &mut seq, &mut lines, typed_ahead).await
}

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}

async fn next_input<R>(lines: &mut Lines<R>) -> std::io::Result<Input>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?.map_or(Input::Closed, Input::Line)),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            Ok(Input::Interrupted)
        }
    }
}

fn stop(practice: &FlashSessionService, seq: &mut FlashSequencer) {
    if let ExitOutcome::DecisionRequired { unsaved } = practice.exit(seq) {
        println!("stopped with {unsaved} unsaved answers");
    }
}

/// Ask until the answers are saved or discarded.
async fn decide<R>(
    practice: &FlashSessionService,
    seq: &mut FlashSequencer,
    lines: &mut Lines<R>,
    mut typed_ahead: Option<String>,
) -> PracticeResult
where
    R: AsyncBufRead + Unpin,
{
    while seq.needs_decision() {
        prompt("save or discard? ")?;
        let input = match typed_ahead.take() {
            Some(line) => Input::Line(line),
            None => next_input(lines).await?,
        };
        let Input::Line(line) = input else {
            let unsaved = seq.session().len();
            warn!(unsaved, "practice input ended with undecided answers");
            return Err(PracticeError::Undecided { unsaved }.into());
        };

        let decision = match line.parse::<SaveDecision>() {
            Ok(decision) => decision,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        match practice.resolve(seq, decision).await {
            Ok(outcome) => println!("{outcome}"),
            Err(SessionError::Persistence(err)) => {
                println!("could not save ({err}); answers kept, try again");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn prompt(text: &str) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()
}

fn render(event: &RevealEvent) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    match event {
        RevealEvent::QuestionLoaded {
            position, total, ..
        } => writeln!(out, "question {}/{total}", position + 1)?,
        RevealEvent::Reveal { value, .. } => writeln!(out, "  {value}")?,
        RevealEvent::InputReady { .. } => write!(out, "answer> ")?,
        RevealEvent::Outcome {
            is_correct: true, ..
        } => writeln!(out, "correct")?,
        RevealEvent::Outcome { correct_answer, .. } => {
            writeln!(out, "wrong, the answer was {correct_answer}")?;
        }
        RevealEvent::SessionComplete { answered, correct } => {
            writeln!(out, "finished: {correct}/{answered} correct")?;
        }
    }
    out.flush()
}
