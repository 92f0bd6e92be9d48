use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    terminal,
};
use futures_util::{pin_mut, StreamExt};
use schemars::schema_for;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use quizmaker::answers::ItemOutcome;
use quizmaker::capture::{typewriter, CommandFrameSource, InputTab};
use quizmaker::config::ServiceConfig;
use quizmaker::interceptors::FileInterceptor;
use quizmaker::models::{AnswerType, Difficulty, InputKind, Question, QuestionStatus, Verdict};
use quizmaker::subjects::SubjectDraft;
use quizmaker::wire::{FollowUpAnswer, GenerateData, VerifyBody};
use quizmaker::{GenerationOutcome, HttpQuizService, QuizPage, QuizService, SessionStore};

#[derive(Parser)]
#[command(author, version, about = "Generate and take quizzes from the terminal", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    QUIZ_API_URL   Base URL of the quiz service (also read from .env)
    RUST_LOG       Log filter, e.g. quizmaker=debug

EXAMPLES:
    quizmaker subjects
    quizmaker quiz --subject Math --answer-type \"multiple choice\" --difficulty easy --count 3 --image page.png
    quizmaker quiz --subject History --answer-type descriptive --difficulty hard --camera \"fswebcam --png 0 -\"
    quizmaker chat --subject English --answer-type \"short answer\" --difficulty medium")]
struct Cli {
    /// Override the quiz service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Write a markdown transcript of every service exchange into this directory
    #[arg(long, global = true)]
    record_dir: Option<PathBuf>,

    /// Give up on a service call after this many seconds (default: wait forever)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List subjects, optionally adding one backed by a PDF
    Subjects {
        /// Name of a subject to add
        #[arg(long, requires = "pdf")]
        add: Option<String>,
        /// Source PDF of the added subject
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Generate a quiz from a picked image or a camera frame, then answer it
    Quiz {
        #[command(flatten)]
        options: QuizArgs,
        /// Image of the source page
        #[arg(long, conflicts_with = "camera")]
        image: Option<PathBuf>,
        /// Command that writes one PNG frame to stdout
        #[arg(long)]
        camera: Option<String>,
    },
    /// Chat about a subject; the answers become the quiz source text
    Chat {
        #[arg(long)]
        subject: String,
        /// Answer type for a quiz generated after the chat
        #[arg(long, requires = "difficulty")]
        answer_type: Option<AnswerType>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long, default_value_t = 1)]
        count: i64,
        /// Submit without asking for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Print the JSON schemas of the service payloads
    Schema,
}

#[derive(Args)]
struct QuizArgs {
    #[arg(long)]
    subject: String,
    /// Random, Multiple Choice, Short Answer or Descriptive
    #[arg(long)]
    answer_type: AnswerType,
    /// Easy, Medium or Hard
    #[arg(long)]
    difficulty: Difficulty,
    /// Number of questions (clamped to 1..=10)
    #[arg(long, default_value_t = 1)]
    count: i64,
    /// Submit without asking for confirmation
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Schema => print_schemas(),
        Command::Subjects { add, pdf } => list_subjects(add.as_deref(), pdf.clone()),
        Command::Quiz { options, image, camera } => {
            let mut page = QuizPage::new(build_service(&cli)?, SessionStore::new());
            page.select_subject(&options.subject)?;
            apply_options(&mut page, options.answer_type, options.difficulty, options.count);

            if let Some(path) = image {
                let picked = page.pick_image(path).await?;
                println!("📷 {}", picked.preview());
            } else if let Some(command_line) = camera {
                let source = CommandFrameSource::parse(command_line).context("--camera needs a command")?;
                page.open_camera()?;
                let captured = page.capture_frame(&source).await?;
                println!("📷 {}", captured.preview());
            }

            let mut input = BufReader::new(tokio::io::stdin()).lines();
            run_quiz(&mut page, &mut input, options.yes).await
        }
        Command::Chat { subject, answer_type, difficulty, count, yes } => {
            let mut page = QuizPage::new(build_service(&cli)?, SessionStore::new());
            page.select_subject(subject)?;
            page.select_tab(InputTab::Text);

            let mut input = BufReader::new(tokio::io::stdin()).lines();
            chat_loop(&mut page, &mut input).await?;

            match (answer_type, difficulty) {
                (Some(answer_type), Some(difficulty)) => {
                    apply_options(&mut page, *answer_type, *difficulty, *count);
                    run_quiz(&mut page, &mut input, *yes).await
                }
                _ => Ok(()),
            }
        }
    }
}

fn build_service(cli: &Cli) -> Result<Box<dyn QuizService>> {
    let mut config = match &cli.base_url {
        Some(url) => ServiceConfig::new(url.clone()),
        None => ServiceConfig::default(),
    };
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let mut service = HttpQuizService::new(config)?;
    if let Some(dir) = &cli.record_dir {
        service = service.with_interceptor(Arc::new(FileInterceptor::new(dir.clone())));
    }
    Ok(Box::new(service))
}

fn apply_options<S: QuizService>(page: &mut QuizPage<S>, answer_type: AnswerType, difficulty: Difficulty, count: i64) {
    let options = page.options_mut();
    options.select_answer_type(answer_type);
    options.select_difficulty(difficulty);
    options.set_question_count(count);
}

fn print_schemas() -> Result<()> {
    let schemas = [
        ("generate request (multipart part `data`)", serde_json::to_value(schema_for!(GenerateData))?),
        ("generate response", serde_json::to_value(schema_for!(Vec<Question>))?),
        ("verify request", serde_json::to_value(schema_for!(VerifyBody))?),
        ("verify response", serde_json::to_value(schema_for!(Verdict))?),
        ("follow-up response", serde_json::to_value(schema_for!(FollowUpAnswer))?),
    ];
    for (title, schema) in schemas {
        println!("## {}\n{}\n", title, serde_json::to_string_pretty(&schema)?);
    }
    Ok(())
}

fn list_subjects(add: Option<&str>, pdf: Option<PathBuf>) -> Result<()> {
    let store = SessionStore::new();
    if let Some(name) = add {
        let mut draft = SubjectDraft::new(name);
        if let Some(path) = pdf {
            draft = draft.with_document(path);
        }
        let added = draft.submit(&store)?;
        println!("✅ Added {}", added);
    }
    for subject in store.subjects() {
        if subject.source_reference.is_empty() {
            println!("  {}", subject.name);
        } else {
            println!("  {} ({})", subject.name, subject.source_reference);
        }
    }
    Ok(())
}

async fn chat_loop<S: QuizService, R: AsyncBufRead + Unpin>(page: &mut QuizPage<S>, input: &mut Lines<R>) -> Result<()> {
    println!("What would you like to know? (empty line to finish)");
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = input.next_line().await? else { break };
        if line.trim().is_empty() {
            break;
        }

        println!("…");
        match page.ask(&line).await {
            Ok(answer) => {
                let reveal = typewriter(answer, Duration::from_millis(8));
                pin_mut!(reveal);
                let mut shown = 0;
                while let Some(prefix) = reveal.next().await {
                    print!("{}", &prefix[shown..]);
                    io::stdout().flush()?;
                    shown = prefix.len();
                }
                println!();
            }
            Err(e) => eprintln!("❌ {}", e),
        }
    }
    Ok(())
}

async fn run_quiz<S: QuizService, R: AsyncBufRead + Unpin>(page: &mut QuizPage<S>, input: &mut Lines<R>, yes: bool) -> Result<()> {
    println!("Making Quiz...");
    match page.generate().await {
        Ok(GenerationOutcome::Ready(0)) => {
            println!("The service returned no questions.");
            return Ok(());
        }
        Ok(GenerationOutcome::Ready(_)) => {}
        Ok(GenerationOutcome::Discarded) => bail!("subject changed while generating"),
        Err(e) => {
            let banner = page.store().error().unwrap_or_else(|| e.to_string());
            bail!(banner);
        }
    }

    let questions = page.store().questions();
    for (index, question) in questions.iter().enumerate() {
        print_question(index, question);
        loop {
            print!("Your answer: ");
            io::stdout().flush()?;
            let Some(line) = input.next_line().await? else { break };
            let answer = resolve_choice(question, line.trim());
            match page.set_answer(index, answer) {
                Ok(()) => break,
                Err(e) => println!("❌ {}", e),
            }
        }
    }

    if !page.can_submit() {
        bail!("answers cannot be submitted");
    }
    if !yes && !confirm("Submit answers? (y/N): ", input).await? {
        println!("Not submitted.");
        return Ok(());
    }

    let report = page.submit().await?;
    let state = page.store().snapshot();
    for (index, (question, outcome)) in state.questions.iter().zip(&report.outcomes).enumerate() {
        match (question.status, outcome) {
            (Some(status), _) => {
                let mark = if status == QuestionStatus::Correct { "✅ Correct" } else { "❌ Incorrect" };
                println!("Question {}. {}", index + 1, mark);
                if let Some(feedback) = &question.feedback {
                    println!("   {}", feedback);
                }
            }
            (None, ItemOutcome::Failed(e)) => println!("Question {}. ⚠️ not graded: {}", index + 1, e),
            (None, _) => println!("Question {}. ⚠️ not graded", index + 1),
        }
    }
    let (correct, total) = state.score();
    println!("\nScore: {}/{}", correct, total);
    Ok(())
}

fn print_question(index: usize, question: &Question) {
    println!("\nQuestion {}.", index + 1);
    for line in question.question.lines() {
        println!("  {}", line);
    }
    match question.input_kind() {
        InputKind::SingleSelect(choices) => {
            for (i, choice) in choices.iter().enumerate() {
                println!("  {}) {}", i + 1, choice);
            }
        }
        InputKind::FreeText => println!("  (write your answer)"),
    }
}

/// Multiple choice answers may be given by number.
fn resolve_choice(question: &Question, raw: &str) -> String {
    if let InputKind::SingleSelect(choices) = question.input_kind() {
        if let Ok(n) = raw.parse::<usize>() {
            if let Some(choice) = n.checked_sub(1).and_then(|i| choices.get(i)) {
                return choice.clone();
            }
        }
    }
    raw.to_string()
}

/// y/N prompt. A single keystroke on a terminal; otherwise the next line of
/// `input`, so piped answers and the confirmation share one reader.
async fn confirm<R: AsyncBufRead + Unpin>(prompt: &str, input: &mut Lines<R>) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    if io::stdin().is_terminal() {
        if let Ok(answer) = read_single_key() {
            println!("{}", if answer { "y" } else { "n" });
            return Ok(answer);
        }
    }
    read_confirmation(input).await
}

async fn read_confirmation<R: AsyncBufRead + Unpin>(input: &mut Lines<R>) -> io::Result<bool> {
    Ok(input.next_line().await?.map_or(false, |line| line.trim().eq_ignore_ascii_case("y")))
}

fn read_single_key() -> io::Result<bool> {
    terminal::enable_raw_mode()?;
    let answer = wait_for_key();
    // Restore the terminal before reporting a read failure.
    let restored = terminal::disable_raw_mode();
    let answer = answer?;
    restored?;
    Ok(answer)
}

fn wait_for_key() -> io::Result<bool> {
    if event::poll(Duration::from_secs(30))? {
        Ok(is_yes(&event::read()?))
    } else {
        Ok(false)
    }
}

fn is_yes(event: &Event) -> bool {
    matches!(event, Event::Key(KeyEvent { code: KeyCode::Char('y' | 'Y'), .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[tokio::test]
    async fn confirmation_reads_from_the_shared_reader() {
        let mut input = BufReader::new(&b"2\ny\nleftover\n"[..]).lines();
        assert_eq!(input.next_line().await.unwrap().as_deref(), Some("2"));
        assert!(read_confirmation(&mut input).await.unwrap());
        assert_eq!(input.next_line().await.unwrap().as_deref(), Some("leftover"));
    }

    #[tokio::test]
    async fn confirmation_defaults_to_no() {
        let mut input = BufReader::new(&b"nope\n"[..]).lines();
        assert!(!read_confirmation(&mut input).await.unwrap());
        assert!(!read_confirmation(&mut input).await.unwrap());
    }

    #[test]
    fn only_y_confirms() {
        assert!(is_yes(&Event::Key(KeyEvent::new(KeyCode::Char('Y'), KeyModifiers::SHIFT))));
        assert!(!is_yes(&Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))));
        assert!(!is_yes(&Event::FocusGained));
    }

    #[test]
    fn choices_resolve_by_number() {
        let question = Question::multiple_choice("Pick", vec!["A".to_string(), "B".to_string()], None);
        assert_eq!(resolve_choice(&question, "2"), "B");
        assert_eq!(resolve_choice(&question, "3"), "3");
        assert_eq!(resolve_choice(&question, "A"), "A");
    }
}
