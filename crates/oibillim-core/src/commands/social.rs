use std::io::Write;

use anyhow::Context;
use tracing::{info, instrument};

use super::{App, required};
use crate::forms::ReviewDraft;
use crate::model::ReviewTarget;
use crate::store::Action;

/// `review <id> <rating> <text...> [--owner]`
#[instrument(skip(app, out, args))]
pub(super) fn cmd_review<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    let rating = required(args, 1, "rating")?;
    info!(item_id, rating, "command review");

    let mut draft = ReviewDraft::new(item_id);
    draft.rating = rating
        .parse()
        .with_context(|| format!("invalid rating: {rating}"))?;

    let mut words = Vec::new();
    for word in &args[2..] {
        if word == "--owner" {
            draft.target = ReviewTarget::Owner;
        } else {
            words.push(word.as_str());
        }
    }
    draft.content = words.join(" ");

    app.store.require_item(item_id)?;
    let notice = app.store.dispatch(Action::SubmitReview(draft), app.now)?;
    app.renderer.print_notice(out, &notice)
}

#[instrument(skip(app, out, args))]
pub(super) fn cmd_favorite<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    info!(item_id, "command favorite");

    let notice = app.store.dispatch(
        Action::ToggleFavorite {
            item_id: item_id.to_string(),
        },
        app.now,
    )?;
    app.renderer.print_notice(out, &notice)
}

pub(super) fn cmd_favorites<W: Write>(app: &mut App, out: &mut W) -> anyhow::Result<()> {
    info!("command favorites");
    let favorites = app.store.favorites();
    if favorites.is_empty() {
        writeln!(out, "관심 품목이 없습니다.")?;
        return Ok(());
    }
    app.renderer.print_item_table(out, &app.store, &favorites)
}

pub(super) fn cmd_chats<W: Write>(app: &mut App, out: &mut W) -> anyhow::Result<()> {
    info!("command chats");
    app.renderer.print_chats(out, app.store.chats())
}

/// Shows the thread with `partner`, sending the remaining words first if
/// there are any.
#[instrument(skip(app, out, args))]
pub(super) fn cmd_chat<W: Write>(app: &mut App, out: &mut W, args: &[String]) -> anyhow::Result<()> {
    let partner = required(args, 0, "partner name")?;
    info!(partner, "command chat");

    if args.len() > 1 {
        let notice = app.store.dispatch(
            Action::SendMessage {
                partner: partner.to_string(),
                content: args[1..].join(" "),
            },
            app.now,
        )?;
        if notice.is_rejection() {
            return app.renderer.print_notice(out, &notice);
        }
    }

    app.renderer
        .print_thread(out, partner, app.store.thread(partner))
}
