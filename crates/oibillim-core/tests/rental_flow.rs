use chrono::{TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use oibillim_core::availability::{DayStatus, PeriodPolicy};
use oibillim_core::calendar::{CalendarDay, WeekStart};
use oibillim_core::config::Config;
use oibillim_core::picker::{CellMark, SubmitOutcome};
use oibillim_core::seed;
use oibillim_core::selection::{Selection, SelectionError};
use oibillim_core::store::{Action, AppStore, Notice, StoreBooking};
use tempfile::tempdir;

fn day(raw: &str) -> CalendarDay {
    raw.parse().expect("valid day")
}

#[test]
fn tent_rental_respects_periods_and_reservations() {
    let now = Utc
        .with_ymd_and_hms(2024, 7, 1, 1, 0, 0)
        .single()
        .expect("now");
    let mut store = AppStore::from_seed(seed::embedded().expect("seed"), Seoul);

    let mut picker = store
        .open_picker("3", WeekStart::Sunday, day("2024-07-01"))
        .expect("picker");
    assert_eq!(picker.selection(), Selection::Empty);

    let view = picker.month_view().expect("view");
    let mark = |key: &str| {
        view.cells
            .iter()
            .find(|cell| cell.day == day(key))
            .map(|cell| cell.mark)
    };
    assert_eq!(mark("2024-07-05"), Some(CellMark::Open));
    assert_eq!(
        mark("2024-07-10"),
        Some(CellMark::Blocked(DayStatus::OutsidePeriods))
    );
    assert_eq!(
        mark("2024-07-21"),
        Some(CellMark::Blocked(DayStatus::Reserved))
    );

    picker.click(day("2024-07-18"));
    picker.click(day("2024-07-22"));
    let mut booking = StoreBooking::new(&mut store, now);
    let outcome = picker.submit(&mut booking).expect("submit");
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(SelectionError::RangeConflict {
            day: day("2024-07-20")
        })
    );
    assert!(booking.into_notice().is_none());
    assert!(picker.selection().is_complete());

    picker.click(day("2024-07-04"));
    picker.click(day("2024-07-06"));
    let mut booking = StoreBooking::new(&mut store, now);
    let outcome = picker.submit(&mut booking).expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Requested(_)));
    assert_eq!(
        booking.into_notice(),
        Some(Notice::RentalRequested {
            item_id: "3".to_string()
        })
    );
    picker.cancel();

    let reopened = store
        .open_picker("3", WeekStart::Sunday, day("2024-07-01"))
        .expect("picker");
    assert_eq!(reopened.selection(), Selection::Empty);
    assert!(reopened.availability().is_reserved(day("2024-07-05")));

    let notice = store
        .dispatch(
            Action::ReturnItem {
                item_id: "3".to_string(),
            },
            now,
        )
        .expect("return");
    assert_eq!(notice.to_string(), "반납이 완료되었습니다!");
}

#[test]
fn config_file_drives_policy_and_seed() {
    let temp = tempdir().expect("tempdir");

    let mut seed = seed::embedded().expect("seed");
    seed.items.retain(|item| item.id == "6");
    let seed_path = temp.path().join("seed.json");
    std::fs::write(&seed_path, serde_json::to_string(&seed).expect("json")).expect("write seed");

    let rc = temp.path().join("oibillimrc");
    std::fs::write(
        &rc,
        format!(
            "rental.period_policy=closed\nseed.location={}\n",
            seed_path.display()
        ),
    )
    .expect("write rc");

    let cfg = Config::load(Some(rc.as_path())).expect("config");
    let policy = cfg.period_policy().expect("policy");
    assert_eq!(policy, PeriodPolicy::ClosedWhenUndeclared);

    let loaded = seed::load(cfg.seed_path().as_deref()).expect("seed file");
    let store = AppStore::from_seed(loaded, Seoul).with_period_policy(policy);
    assert_eq!(store.items().len(), 1);

    let picker = store
        .open_picker("6", cfg.week_start().expect("week start"), day("2024-06-18"))
        .expect("picker");
    assert_eq!(
        picker.availability().status(day("2024-06-20")),
        DayStatus::OutsidePeriods
    );
}
