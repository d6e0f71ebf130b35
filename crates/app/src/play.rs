//! Terminal front-end: one prompt per line on stdin.

use std::error::Error;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use classroom_core::model::{CardId, ResultSummary, ScoreBoard, ScoreChange, UserHandle};
use services::summary::format_elapsed;
use services::{
    Advance, CardFace, ClassroomService, DeferredTicket, GameSession, MatchPhase, MatchingSession,
    QuizSession, RevealOutcome, SessionError,
};

type Input = Lines<BufReader<Stdin>>;

fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn prompt(input: &mut Input, text: &str) -> std::io::Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    input.next_line().await
}

/// Sleep until `ticket` is due on the service clock.
async fn wait_for(service: &ClassroomService, ticket: DeferredTicket) {
    while let Ok(delay) = ticket.remaining(service.now()).to_std() {
        if delay.is_zero() {
            break;
        }
        tokio::time::sleep(delay).await;
    }
}

pub async fn run_quiz(
    service: &ClassroomService,
    quiz: &mut QuizSession,
) -> Result<(), Box<dyn Error>> {
    let mut input = stdin_lines();
    println!(
        "{} ({}), {} questions",
        quiz.kind(),
        quiz.difficulty().label(),
        quiz.target_count()
    );

    while let Some(question) = quiz.current_question().cloned() {
        println!(
            "\n[{}/{}] {}",
            quiz.answered_count() + 1,
            quiz.target_count(),
            question.prompt()
        );
        if !question.media().is_empty() {
            println!("  picture: {}", question.media().as_str());
        }

        let Some(answer) = prompt(&mut input, "answer> ").await? else {
            println!("\ninput closed, stopping");
            return Ok(());
        };
        let verdict = quiz.submit_answer(&answer, service.now())?;

        if verdict.correct {
            println!("Correct!");
            let name = prompt(&mut input, "who answered? ").await?.unwrap_or_default();
            if quiz.credit(&name)? == ScoreChange::Ignored {
                println!("nobody credited");
            }
        } else {
            println!("Not quite. The answer is {}.", verdict.expected_answer);
        }
        print_scoreboard(quiz.scoreboard());

        wait_for(service, verdict.reveal).await;
        if let Some(Advance::Completed(summary)) =
            quiz.advance_after(verdict.reveal, service.now())?
        {
            print_summary(&summary);
        }
    }
    Ok(())
}

pub async fn run_match(
    service: &ClassroomService,
    game: &mut MatchingSession,
) -> Result<(), Box<dyn Error>> {
    let mut input = stdin_lines();
    println!(
        "memory match ({}), {} pairs per board",
        game.difficulty().label(),
        game.pairs_per_board()
    );

    loop {
        match game.phase() {
            MatchPhase::Completed => return Ok(()),
            MatchPhase::BoardCleared => {
                let team = game.next_team(service.now())?;
                println!("\nTeam {team}, your turn!");
                continue;
            }
            MatchPhase::PairPendingCheck => {
                if let Some(ticket) = game.pending_flip_back() {
                    wait_for(service, ticket).await;
                    game.flip_back(ticket, service.now())?;
                }
                continue;
            }
            MatchPhase::AwaitingFlip => {}
        }

        print_board(game);
        let label = format!("{}, card> ", game.current_team().unwrap_or("team"));
        let Some(line) = prompt(&mut input, &label).await? else {
            println!("\ninput closed, stopping");
            return Ok(());
        };
        let card: CardId = match line.parse() {
            Ok(card) => card,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match game.reveal_card(card, service.now()) {
            Ok(RevealOutcome::FirstCard(_)) => {}
            Ok(RevealOutcome::Matched {
                cleared, summary, ..
            }) => {
                println!("Match!");
                if let Some(done) = cleared {
                    println!("{} cleared the board in {}", done.team, format_elapsed(done.seconds));
                }
                if let Some(summary) = summary {
                    print_summary(&summary);
                }
            }
            Ok(RevealOutcome::Mismatch { .. }) => {
                print_board(game);
                println!("No match.");
            }
            Err(e @ (SessionError::UnknownCard(_) | SessionError::CardUnavailable(_))) => {
                println!("{e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Persist and export a finished game. Failures are reported, not fatal.
pub async fn publish<S>(service: &ClassroomService, user: &UserHandle, session: &S)
where
    S: GameSession + Sync,
{
    if !session.is_complete() {
        println!("game not finished, nothing saved");
        return;
    }
    match service.publish(user, session).await {
        Ok(id) => println!("saved result #{id}"),
        Err(e) => eprintln!("result not saved: {e}"),
    }
    match service.export(user, session).await {
        Ok(filename) => println!("leaderboard written to {filename}"),
        Err(e) => eprintln!("export failed: {e}"),
    }
}

fn print_board(game: &MatchingSession) {
    let cells: Vec<String> = game
        .cards()
        .iter()
        .map(|card| match card.face() {
            CardFace::Hidden => format!("[{:>2}]", card.id().value()),
            CardFace::Revealed => format!("[{:>2}: {}]", card.id().value(), card.item().expected_answer()),
            CardFace::Matched => format!("[{:>2}: ok]", card.id().value()),
        })
        .collect();
    for row in cells.chunks(4) {
        println!("{}", row.join(" "));
    }
}

fn print_scoreboard(board: &ScoreBoard) {
    for participant in board.ranked() {
        println!("  {:<20} {}", participant.name(), participant.metric());
    }
}

fn print_summary(summary: &ResultSummary) {
    println!("\n{} results ({})", summary.kind(), summary.difficulty().label());
    for entry in summary.participants_ranked() {
        println!("{:>3}. {:<20} {}", entry.rank, entry.name, entry.detail);
    }
}
