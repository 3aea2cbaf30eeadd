//! # Bot Flow Tests
//!
//! Drives the menu state machine end to end through `dispatch`, with real
//! spreadsheets and info files in a temporary directory and no Telegram
//! connection.

use anyhow::Result;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use std::sync::{Arc, Mutex};
use teloxide::types::{CallbackQuery, UserId};
use teloxide::Bot;
use tempfile::TempDir;

use workshop_bot::action::Action;
use workshop_bot::app::AppContext;
use workshop_bot::bot::{callback_handler, dispatch, MenuOption, Reply, ReplyFormat};
use workshop_bot::catalog::{read_machine_column, Catalog};
use workshop_bot::config::{Workshop, WorkshopRegistry};
use workshop_bot::localization::Localizer;
use workshop_bot::logging::open_log_file;
use workshop_bot::machine_info::MachineInfoSource;
use workshop_bot::errors::LookupError;
use workshop_bot::session::{self, session_for, Session, SessionState, SessionStorage};

const USER: UserId = UserId(1001);

fn write_roster(path: &Path, header: &str, machines: &[&str]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, header)?;
    for (i, machine) in machines.iter().enumerate() {
        worksheet.write_string(i as u32 + 1, 0, *machine)?;
    }
    workbook.save(path)?;
    Ok(())
}

/// Four workshops: 1 lists A and B, 2 lacks the machine column, 3 has no file,
/// 4 lists C.
fn setup() -> Result<(TempDir, AppContext)> {
    let dir = tempfile::tempdir()?;
    write_roster(&dir.path().join("workshop 1.xlsx"), "Машина", &["A", "B"])?;
    write_roster(&dir.path().join("workshop 2.xlsx"), "Станок", &["X"])?;
    write_roster(&dir.path().join("workshop 4.xlsx"), "Машина", &["C"])?;
    std::fs::write(
        dir.path().join("Machine_info.txt"),
        "A\nInfo about A\n<\nC\nPressure < 5 & rising\n<\n",
    )?;

    let workshops = (1..=4)
        .map(|n| Workshop {
            name: format!("Цех {n}"),
            path: dir.path().join(format!("workshop {n}.xlsx")),
        })
        .collect();
    let ctx = AppContext::new(
        Catalog::new(WorkshopRegistry::new(workshops)?, "Машина"),
        MachineInfoSource::new(dir.path().join("Machine_info.txt")),
        Localizer::new()?,
    );

    Ok((dir, ctx))
}

async fn send(ctx: &AppContext, session: &Session, action: Action) -> Result<Reply> {
    dispatch(ctx, session, USER, action, Some("ru")).await
}

fn workshop_menu() -> Vec<MenuOption> {
    (1..=4)
        .map(|n| MenuOption::Workshop(format!("Цех {n}")))
        .collect()
}

#[tokio::test]
async fn test_full_navigation() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    let reply = send(&ctx, &session, Action::Start).await?;
    assert!(reply.text.starts_with("Добро пожаловать"));
    assert_eq!(reply.options, workshop_menu());
    assert_eq!(session::current(&session).await?, SessionState::AwaitingWorkshop);

    let reply = send(&ctx, &session, Action::SelectWorkshop("Цех 1".into())).await?;
    assert_eq!(reply.text, "Выберите машину:");
    assert_eq!(
        reply.options,
        vec![
            MenuOption::Machine("A".into()),
            MenuOption::Machine("B".into()),
            MenuOption::Back
        ]
    );
    assert_eq!(
        session::current(&session).await?,
        SessionState::AwaitingMachine {
            workshop: "Цех 1".into()
        }
    );

    let reply = send(&ctx, &session, Action::SelectMachine("A".into())).await?;
    assert_eq!(reply.format, ReplyFormat::Html);
    assert_eq!(reply.text, "<b>Информация о машине A:</b>\nInfo about A\n");
    assert_eq!(reply.options, vec![MenuOption::Back]);
    assert_eq!(
        session::current(&session).await?.selected_workshop(),
        Some("Цех 1")
    );

    let reply = send(&ctx, &session, Action::GoBack).await?;
    assert_eq!(reply.text, "Выберите интересующий вас цех:");
    assert_eq!(reply.options, workshop_menu());
    assert_eq!(session::current(&session).await?, SessionState::AwaitingWorkshop);
    Ok(())
}

#[tokio::test]
async fn test_missing_workshop_file_is_reported_and_logged() -> Result<()> {
    let (dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    let log_path = dir.path().join("bot.log");
    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(open_log_file(&log_path)?))
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);

    send(&ctx, &session, Action::Start).await?;
    let reply = send(&ctx, &session, Action::SelectWorkshop("Цех 3".into())).await?;
    drop(guard);

    let missing = dir.path().join("workshop 3.xlsx");
    assert_eq!(reply.text, format!("Файл {} не найден.", missing.display()));
    assert_eq!(reply.options, vec![MenuOption::Back]);
    assert_eq!(session::current(&session).await?, SessionState::AwaitingWorkshop);

    let log = std::fs::read_to_string(&log_path)?;
    assert!(log.contains("ERROR"), "log: {log}");
    assert!(log.contains("workshop 3.xlsx"), "log: {log}");
    assert!(log.contains("User started the bot"), "log: {log}");

    // The menu still works after the failure
    let reply = send(&ctx, &session, Action::SelectWorkshop("Цех 1".into())).await?;
    assert_eq!(reply.options.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_workbook_logs_path_and_cause() -> Result<()> {
    let (dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);
    let broken = dir.path().join("workshop 3.xlsx");
    std::fs::write(&broken, b"this is not a zip archive")?;

    let cause = match read_machine_column(&broken, "Машина") {
        Err(LookupError::ResourceUnreadable { cause, .. }) => cause,
        other => panic!("Expected ResourceUnreadable, got {other:?}"),
    };

    let log_path = dir.path().join("bot.log");
    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(open_log_file(&log_path)?))
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);

    let reply = send(&ctx, &session, Action::SelectWorkshop("Цех 3".into())).await?;
    drop(guard);

    assert_eq!(reply.text, "Ошибка чтения файла. Попробуйте позже.");
    assert_eq!(reply.options, vec![MenuOption::Back]);
    assert_eq!(session::current(&session).await?, SessionState::AwaitingWorkshop);

    let log = std::fs::read_to_string(&log_path)?;
    assert!(log.contains("ERROR"), "log: {log}");
    assert!(log.contains(&broken.display().to_string()), "log: {log}");
    assert!(log.contains(&cause), "log: {log}");
    Ok(())
}

#[tokio::test]
async fn test_schema_mismatch_keeps_previous_workshop() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    send(&ctx, &session, Action::SelectWorkshop("Цех 1".into())).await?;
    let reply = send(&ctx, &session, Action::SelectWorkshop("Цех 2".into())).await?;

    assert_eq!(reply.text, "В файле отсутствует столбец 'Машина'.");
    assert_eq!(reply.options, vec![MenuOption::Back]);
    assert_eq!(
        session::current(&session).await?.selected_workshop(),
        Some("Цех 1")
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_machine() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    send(&ctx, &session, Action::SelectWorkshop("Цех 1".into())).await?;
    let reply = send(&ctx, &session, Action::SelectMachine("B".into())).await?;

    assert_eq!(reply.format, ReplyFormat::Plain);
    assert_eq!(reply.text, "Информация о машине B не найдена.");
    assert_eq!(reply.options, vec![MenuOption::Back]);
    Ok(())
}

#[tokio::test]
async fn test_machine_lookup_is_permissive() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    // "C" belongs to workshop 4 but is looked up while workshop 1 is selected
    send(&ctx, &session, Action::SelectWorkshop("Цех 1".into())).await?;
    let reply = send(&ctx, &session, Action::SelectMachine("C".into())).await?;

    assert_eq!(
        reply.text,
        "<b>Информация о машине C:</b>\nPressure &lt; 5 &amp; rising\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_unprefixed_callback_payloads() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    let action = Action::from_callback_data("Цех 4", ctx.workshops());
    let reply = send(&ctx, &session, action).await?;
    assert_eq!(
        reply.options,
        vec![MenuOption::Machine("C".into()), MenuOption::Back]
    );

    let action = Action::from_callback_data("A", ctx.workshops());
    let reply = send(&ctx, &session, action).await?;
    assert!(reply.text.ends_with("Info about A\n"));
    Ok(())
}

#[tokio::test]
async fn test_english_replies() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let session = session_for(SessionStorage::new(), USER);

    let reply = dispatch(&ctx, &session, USER, Action::Help, Some("en-GB")).await?;
    assert!(reply.text.contains("/start"));
    assert_eq!(reply.options, workshop_menu());

    let reply = dispatch(&ctx, &session, USER, Action::SelectMachine("Z".into()), Some("en")).await?;
    assert_eq!(reply.text, "No information found for machine Z.");
    Ok(())
}

#[tokio::test]
async fn test_users_do_not_share_sessions() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let storage = SessionStorage::new();
    let alice = session_for(storage.clone(), UserId(1));
    let bob = session_for(storage, UserId(2));

    send(&ctx, &alice, Action::SelectWorkshop("Цех 1".into())).await?;
    send(&ctx, &bob, Action::Start).await?;

    assert_eq!(session::current(&alice).await?.selected_workshop(), Some("Цех 1"));
    assert_eq!(session::current(&bob).await?, SessionState::AwaitingWorkshop);
    Ok(())
}

/// Bot pointed at a closed local port, so every API request fails
fn unreachable_bot() -> Result<Bot> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/", listener.local_addr()?);
    drop(listener);
    Ok(Bot::new("123:test").set_api_url(url.parse()?))
}

#[tokio::test]
async fn test_button_press_handled_when_answer_fails() -> Result<()> {
    let (_dir, ctx) = setup()?;
    let storage = SessionStorage::new();
    let query: CallbackQuery = serde_json::from_value(serde_json::json!({
        "id": "42",
        "from": { "id": USER.0, "is_bot": false, "first_name": "Ivan" },
        "chat_instance": "1",
        "data": "ws:Цех 1"
    }))?;

    // Sending the reply fails too; the session must still move on
    let result = callback_handler(unreachable_bot()?, query, Arc::new(ctx), storage.clone()).await;
    assert!(result.is_err());

    let session = session_for(storage, USER);
    assert_eq!(
        session::current(&session).await?.selected_workshop(),
        Some("Цех 1")
    );
    Ok(())
}
