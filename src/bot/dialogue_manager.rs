//! Dialogue Manager module for routing actions through the menu state machine
//!
//! | state | action | next state |
//! |---|---|---|
//! | any | `Start`, `GoBack` | `AwaitingWorkshop` |
//! | any | `SelectWorkshop(w)` that lists | `AwaitingMachine { w }` |
//! | any | `SelectWorkshop(w)` that fails | unchanged |
//! | any | `SelectMachine(m)`, `Help` | unchanged |
//!
//! Machine lookups are permissive: any identifier is looked up, including one
//! from a keyboard of another workshop or one the user never saw listed.

use anyhow::Result;
use teloxide::types::UserId;
use tracing::{debug, error, info, warn};

use crate::action::Action;
use crate::app::AppContext;
use crate::errors::LookupError;
use crate::session::{self, Session};

use super::ui_builder::{format_machine_info, machine_options, workshop_options, MenuOption, Reply};

/// Apply `action` to the user's session and build the reply.
///
/// Lookup failures become error replies; only session storage errors propagate.
pub async fn dispatch(
    ctx: &AppContext,
    session: &Session,
    user_id: UserId,
    action: Action,
    language_code: Option<&str>,
) -> Result<Reply> {
    debug!(user_id = %user_id, action = ?action, "Dispatching action");

    match action {
        Action::Start => handle_start(ctx, session, user_id, language_code).await,
        Action::Help => Ok(handle_help(ctx, language_code)),
        Action::GoBack => handle_go_back(ctx, session, user_id, language_code).await,
        Action::SelectWorkshop(workshop) => {
            handle_workshop_selection(ctx, session, user_id, &workshop, language_code).await
        }
        Action::SelectMachine(machine) => {
            Ok(handle_machine_selection(ctx, user_id, &machine, language_code).await)
        }
    }
}

async fn handle_start(
    ctx: &AppContext,
    session: &Session,
    user_id: UserId,
    language_code: Option<&str>,
) -> Result<Reply> {
    session::start(session).await?;
    info!(user_id = %user_id, "User started the bot");

    let text = format!(
        "{}\n{}",
        ctx.localizer.t_lang("welcome", language_code),
        ctx.localizer.t_lang("choose-workshop", language_code)
    );
    Ok(Reply::plain(text, workshop_options(ctx.workshops().names())))
}

fn handle_help(ctx: &AppContext, language_code: Option<&str>) -> Reply {
    Reply::plain(
        ctx.localizer.t_lang("help", language_code),
        workshop_options(ctx.workshops().names()),
    )
}

async fn handle_go_back(
    ctx: &AppContext,
    session: &Session,
    user_id: UserId,
    language_code: Option<&str>,
) -> Result<Reply> {
    session::go_back(session).await?;
    debug!(user_id = %user_id, "User returned to workshop selection");

    Ok(Reply::plain(
        ctx.localizer.t_lang("choose-workshop", language_code),
        workshop_options(ctx.workshops().names()),
    ))
}

async fn handle_workshop_selection(
    ctx: &AppContext,
    session: &Session,
    user_id: UserId,
    workshop: &str,
    language_code: Option<&str>,
) -> Result<Reply> {
    let machines = match ctx.catalog.list_machines(workshop).await {
        Ok(machines) => machines,
        Err(e) => return Ok(error_reply(ctx, user_id, &e, language_code)),
    };

    session::select_workshop(session, ctx.workshops(), workshop).await?;
    info!(
        user_id = %user_id,
        workshop = %workshop,
        machines_count = machines.len(),
        "User selected workshop"
    );

    if machines.is_empty() {
        return Ok(Reply::plain(
            ctx.localizer
                .t_args_lang("no-machines", &[("workshop", workshop)], language_code),
            vec![MenuOption::Back],
        ));
    }

    Ok(Reply::plain(
        ctx.localizer.t_lang("choose-machine", language_code),
        machine_options(machines),
    ))
}

async fn handle_machine_selection(
    ctx: &AppContext,
    user_id: UserId,
    machine: &str,
    language_code: Option<&str>,
) -> Reply {
    match ctx.machine_info.find_machine_info(machine).await {
        Ok(block) => {
            debug!(user_id = %user_id, machine = %machine, "Machine info found");
            let title =
                ctx.localizer
                    .t_args_lang("machine-info-title", &[("machine", machine)], language_code);
            Reply::html(
                format_machine_info(&title, &block.body),
                vec![MenuOption::Back],
            )
        }
        Err(e) => error_reply(ctx, user_id, &e, language_code),
    }
}

/// Log a lookup failure and turn it into a message with a back button
fn error_reply(
    ctx: &AppContext,
    user_id: UserId,
    err: &LookupError,
    language_code: Option<&str>,
) -> Reply {
    let localizer = &ctx.localizer;
    let key = err.message_key();

    let text = match err {
        LookupError::UnknownWorkshop(name) => {
            warn!(user_id = %user_id, workshop = %name, "Unknown workshop requested");
            localizer.t_args_lang(key, &[("name", name.as_str())], language_code)
        }
        LookupError::ResourceNotFound { path } => {
            error!(user_id = %user_id, path = %path.display(), "File not found");
            let path = path.display().to_string();
            localizer.t_args_lang(key, &[("path", path.as_str())], language_code)
        }
        LookupError::ResourceUnreadable { path, cause } => {
            error!(user_id = %user_id, path = %path.display(), error = %cause, "Failed to read file");
            localizer.t_lang(key, language_code)
        }
        LookupError::SchemaMismatch { path, column } => {
            error!(user_id = %user_id, path = %path.display(), column = %column, "Spreadsheet is missing the machine column");
            localizer.t_args_lang(key, &[("column", column.as_str())], language_code)
        }
        LookupError::NotFound { machine } => {
            warn!(user_id = %user_id, machine = %machine, "No info block for machine");
            localizer.t_args_lang(key, &[("machine", machine.as_str())], language_code)
        }
    };

    Reply::plain(text, vec![MenuOption::Back])
}
