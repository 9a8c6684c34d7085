use std::io::Write;

use anyhow::anyhow;
use tracing::{debug, info, instrument, warn};

use super::{App, required};
use crate::forms::{CoordinateField, ItemRegistrationForm};
use crate::model::Category;
use crate::store::Action;

pub(super) fn cmd_profile<W: Write>(app: &mut App, out: &mut W) -> anyhow::Result<()> {
    info!("command profile");
    app.renderer.print_profile(out, &app.store)
}

#[instrument(skip(app, out, args))]
pub(super) fn cmd_owner<W: Write>(app: &mut App, out: &mut W, args: &[String]) -> anyhow::Result<()> {
    let owner_id = required(args, 0, "owner id")?;
    info!(owner_id, "command owner");

    let profile = app
        .store
        .owner_profile(owner_id)
        .ok_or_else(|| anyhow!("owner not found: {owner_id}"))?;
    app.renderer.print_owner(out, &app.store, &profile)
}

pub(super) fn cmd_points<W: Write>(app: &mut App, out: &mut W) -> anyhow::Result<()> {
    info!("command points");
    app.renderer.print_points(out, &app.store)
}

/// `register name=... description=... price=... category=... image=...
/// [lat=... lng=...] [address=...]`
#[instrument(skip(app, out, args))]
pub(super) fn cmd_register<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command register");

    let form = parse_registration(args)?;
    let notice = app.store.dispatch(Action::RegisterItem(form), app.now)?;
    app.renderer.print_notice(out, &notice)
}

fn parse_registration(args: &[String]) -> anyhow::Result<ItemRegistrationForm> {
    let mut form = ItemRegistrationForm::default();

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got: {arg}"))?;
        let value = value.trim();
        debug!(key, value, "registration field");

        match key.trim() {
            "name" => form.name = value.to_string(),
            "description" | "desc" => form.description = value.to_string(),
            // Unparsable prices count as zero and fail validation.
            "price" => form.price_per_day = value.parse().unwrap_or(0),
            "category" => form.category = Category::parse(value)?,
            "image" | "image_url" => form.image_url = value.to_string(),
            "lat" | "lng" => {
                let field = if key.trim() == "lat" {
                    CoordinateField::Lat
                } else {
                    CoordinateField::Lng
                };
                if !form.set_coordinate(field, value) {
                    warn!(key, value, "ignoring unparsable coordinate");
                }
            }
            "address" => {
                let (lat, lng) = (form.location.lat, form.location.lng);
                form.set_location(lat, lng, value);
            }
            other => return Err(anyhow!("unknown registration field: {other}")),
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{app, run};
    use super::*;
    use crate::forms::{DEFAULT_LATITUDE, FormError};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn registration_fields_map_onto_form() {
        let form = parse_registration(&args(&[
            "name=빔 프로젝터",
            "desc=가정용",
            "price=9000",
            "category=digital",
            "image=https://example.com/beam.jpg",
            "lat=north",
            "lng=127.01",
            "address=서울특별시 종로구",
        ]))
        .expect("form");
        assert_eq!(form.price_per_day, 9000);
        assert_eq!(form.category, Category::Digital);
        assert_eq!(form.location.lat, DEFAULT_LATITUDE);
        assert_eq!(form.location.lng, 127.01);
        assert_eq!(form.location.address.as_deref(), Some("서울특별시 종로구"));
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn bad_price_fails_validation_not_parsing() {
        let form = parse_registration(&args(&[
            "name=의자",
            "desc=나무 의자",
            "price=abc",
            "image=x",
        ]))
        .expect("form");
        assert_eq!(form.validate(), Err(FormError::InvalidPrice));
        assert!(parse_registration(&args(&["color=red"])).is_err());
    }

    #[test]
    fn registered_item_appears_in_profile() {
        let mut app = app();
        let text = run(&mut app, "register", &["name=의자"]).expect("register");
        assert!(text.contains("물품 설명을 입력해주세요."));

        run(
            &mut app,
            "register",
            &[
                "name=접이식 의자",
                "desc=캠핑용",
                "price=1500",
                "image=https://example.com/chair.jpg",
            ],
        )
        .expect("register");
        let text = run(&mut app, "profile", &[]).expect("profile");
        assert!(text.contains("짱구 (Jjanggu)"));
        assert!(text.contains("접이식 의자"));
        assert!(text.contains("포인트 28,000"));
    }

    #[test]
    fn points_and_unknown_owner() {
        let mut app = app();
        let text = run(&mut app, "points", &[]).expect("points");
        assert!(text.contains("-12,000"));
        assert!(run(&mut app, "owner", &["nobody"]).is_err());
    }
}
