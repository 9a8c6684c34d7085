use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::availability::{Availability, AvailablePeriod, PeriodPolicy, ReservedInterval};
use crate::calendar::{CalendarDay, DateRange, WeekStart};
use crate::datetime::{format_clock_label, today_in};
use crate::forms::{FormError, ItemRegistrationForm, ReviewDraft};
use crate::model::{
    BorrowStatus, BorrowedItem, ChatItem, ChatMessage, FavoriteItem, ItemStatus,
    PointSummary, PointTransaction, RentalItem, Review, ReviewTarget, Sender, User,
};
use crate::picker::{BookingHandler, PickerOptions, RentalPicker};
use crate::seed::Seed;
use crate::selection::{SelectionError, validate_range};

/// Every state change goes through one of these.
#[derive(Debug, Clone)]
pub enum Action {
    RequestRental {
        item_id: String,
        range: Option<DateRange>,
    },
    ReturnItem {
        item_id: String,
    },
    SubmitReview(ReviewDraft),
    ToggleFavorite {
        item_id: String,
    },
    SavePeriods {
        item_id: String,
        periods: Vec<AvailablePeriod>,
    },
    RegisterItem(ItemRegistrationForm),
    SendMessage {
        partner: String,
        content: String,
    },
}

/// What the user is told after an action. Rejections leave state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RentalRequested { item_id: String },
    Returned { item_id: String },
    ReviewPosted { item_id: String },
    FavoriteAdded { item_id: String },
    FavoriteRemoved { item_id: String },
    PeriodsSaved { item_id: String, count: usize },
    ItemRegistered { item_id: String },
    MessageSent { partner: String },
    MessageSkipped,
    Unavailable { item_id: String },
    NotRented { item_id: String },
    NotRenter { item_id: String },
    NotOwner { item_id: String },
    Invalid(FormError),
    Conflict(SelectionError),
}

impl Notice {
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MessageSkipped
                | Self::Unavailable { .. }
                | Self::NotRented { .. }
                | Self::NotRenter { .. }
                | Self::NotOwner { .. }
                | Self::Invalid(_)
                | Self::Conflict(_)
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RentalRequested { .. } => f.write_str("대여 요청이 완료되었습니다!"),
            Self::Returned { .. } => f.write_str("반납이 완료되었습니다!"),
            Self::ReviewPosted { .. } => f.write_str("리뷰가 작성되었습니다!"),
            Self::FavoriteAdded { .. } => f.write_str("관심 품목에 등록되었습니다."),
            Self::FavoriteRemoved { .. } => f.write_str("관심 품목에서 해제되었습니다."),
            Self::PeriodsSaved { count, .. } => {
                write!(f, "대여 가능 기간이 저장되었습니다. ({count}개)")
            }
            Self::ItemRegistered { .. } => f.write_str("물품이 성공적으로 등록되었습니다."),
            Self::MessageSent { partner } => write!(f, "{partner}님에게 메시지를 보냈습니다."),
            Self::MessageSkipped => f.write_str("메시지를 입력하세요."),
            Self::Unavailable { .. } => f.write_str("이미 대여 중인 물품입니다."),
            Self::NotRented { .. } => f.write_str("대여 중인 물품이 아닙니다."),
            Self::NotRenter { .. } => f.write_str("대여자 또는 소유자만 반납할 수 있습니다."),
            Self::NotOwner { .. } => {
                f.write_str("물품 소유자만 대여 가능 기간을 설정할 수 있습니다.")
            }
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OwnerProfile<'a> {
    pub owner: User,
    pub items: Vec<&'a RentalItem>,
    pub reviews: Vec<&'a Review>,
}

/// In-memory application state seeded from the mock dataset.
#[derive(Debug, Clone)]
pub struct AppStore {
    tz: Tz,
    policy: PeriodPolicy,
    current_user: User,
    items: Vec<RentalItem>,
    borrowed: Vec<BorrowedItem>,
    favorites: Vec<FavoriteItem>,
    points: Vec<PointTransaction>,
    chats: Vec<ChatItem>,
    default_thread: Vec<ChatMessage>,
    threads: BTreeMap<String, Vec<ChatMessage>>,
}

impl AppStore {
    #[instrument(skip(seed, tz))]
    pub fn from_seed(seed: Seed, tz: Tz) -> Self {
        info!(
            user = %seed.current_user.id,
            items = seed.items.len(),
            timezone = %tz,
            "initialized app store"
        );
        Self {
            tz,
            policy: PeriodPolicy::default(),
            current_user: seed.current_user,
            items: seed.items,
            borrowed: seed.borrowed_items,
            favorites: Vec::new(),
            points: seed.point_transactions,
            chats: seed.chats,
            default_thread: seed.default_thread,
            threads: seed.chat_threads,
        }
    }

    pub fn with_period_policy(mut self, policy: PeriodPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn period_policy(&self) -> PeriodPolicy {
        self.policy
    }

    pub fn current_user(&self) -> &User {
        &self.current_user
    }

    pub fn items(&self) -> &[RentalItem] {
        &self.items
    }

    pub fn item(&self, item_id: &str) -> Option<&RentalItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn require_item(&self, item_id: &str) -> anyhow::Result<&RentalItem> {
        self.item(item_id)
            .ok_or_else(|| anyhow!("item not found: {item_id}"))
    }

    fn item_mut(&mut self, item_id: &str) -> anyhow::Result<&mut RentalItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| anyhow!("item not found: {item_id}"))
    }

    /// Case-insensitive match on name or description. A blank query
    /// returns everything.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Vec<&RentalItem> {
        let found: Vec<&RentalItem> = self
            .items
            .iter()
            .filter(|item| item.matches_query(query))
            .collect();
        debug!(count = found.len(), "search finished");
        found
    }

    pub fn item_status(&self, item: &RentalItem) -> ItemStatus {
        let rented_by_me = self
            .borrowed
            .iter()
            .any(|b| b.item_id == item.id && b.status == BorrowStatus::Renting);
        if rented_by_me {
            ItemStatus::RentedByMe
        } else if !item.is_available {
            ItemStatus::Rented
        } else {
            ItemStatus::Available
        }
    }

    pub fn borrowed(&self) -> &[BorrowedItem] {
        &self.borrowed
    }

    pub fn favorites(&self) -> Vec<&RentalItem> {
        self.items
            .iter()
            .filter(|item| self.is_favorite(&item.id))
            .collect()
    }

    pub fn is_favorite(&self, item_id: &str) -> bool {
        self.favorites.iter().any(|fav| fav.item_id == item_id)
    }

    pub fn owned_by(&self, user_id: &str) -> Vec<&RentalItem> {
        self.items
            .iter()
            .filter(|item| item.is_owned_by(user_id))
            .collect()
    }

    /// Owner details for the profile screen. Owners other than the current
    /// user are reconstructed from their listings.
    pub fn owner_profile(&self, owner_id: &str) -> Option<OwnerProfile<'_>> {
        let items = self.owned_by(owner_id);
        let owner = if owner_id == self.current_user.id {
            self.current_user.clone()
        } else {
            let first = items.first()?;
            User {
                id: first.owner_id.clone(),
                name: first.owner_name.clone(),
                occupation: String::new(),
                rating: first.owner_rating,
                total_transactions: 0,
                profile_image: String::new(),
            }
        };
        let reviews = items
            .iter()
            .flat_map(|item| item.reviews.iter())
            .filter(|review| review.target == ReviewTarget::Owner)
            .collect();

        Some(OwnerProfile {
            owner,
            items,
            reviews,
        })
    }

    pub fn point_history(&self) -> &[PointTransaction] {
        &self.points
    }

    pub fn point_summary(&self) -> PointSummary {
        PointSummary::from_transactions(&self.points)
    }

    pub fn chats(&self) -> &[ChatItem] {
        &self.chats
    }

    pub fn thread(&self, partner: &str) -> &[ChatMessage] {
        self.threads
            .get(partner)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_thread)
    }

    pub fn reserved_times(&self, item_id: &str) -> anyhow::Result<&[ReservedInterval]> {
        Ok(&self.require_item(item_id)?.reserved_times)
    }

    /// Starts a fresh calendar session for `item_id`.
    pub fn open_picker(
        &self,
        item_id: &str,
        week_start: WeekStart,
        today: CalendarDay,
    ) -> anyhow::Result<RentalPicker> {
        let item = self.require_item(item_id)?;
        let options = PickerOptions {
            policy: self.policy,
            week_start,
        };
        Ok(RentalPicker::open(item, options, &self.tz, today))
    }

    #[instrument(skip(self, action, now))]
    pub fn dispatch(&mut self, action: Action, now: DateTime<Utc>) -> anyhow::Result<Notice> {
        let notice = match action {
            Action::RequestRental { item_id, range } => self.request_rental(item_id, range, now)?,
            Action::ReturnItem { item_id } => self.return_item(item_id)?,
            Action::SubmitReview(draft) => self.submit_review(draft, now)?,
            Action::ToggleFavorite { item_id } => self.toggle_favorite(item_id, now)?,
            Action::SavePeriods { item_id, periods } => self.save_periods(item_id, periods)?,
            Action::RegisterItem(form) => self.register_item(form),
            Action::SendMessage { partner, content } => self.send_message(partner, content, now),
        };

        if notice.is_rejection() {
            warn!(%notice, "action rejected");
        } else {
            info!(%notice, "action applied");
        }
        Ok(notice)
    }

    fn request_rental(
        &mut self,
        item_id: String,
        range: Option<DateRange>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Notice> {
        let (tz, policy) = (self.tz, self.policy);
        let renter = self.current_user.id.clone();
        let item = self.item_mut(&item_id)?;
        if !item.is_available {
            return Ok(Notice::Unavailable { item_id });
        }

        if let Some(range) = range {
            let availability =
                Availability::new(&item.reserved_times, &item.available_periods, policy, &tz);
            if let Err(err) = validate_range(range.start, range.end, &availability) {
                return Ok(Notice::Conflict(err));
            }
            item.reserved_times.push(ReservedInterval::from(range));
        }

        item.is_available = false;
        item.current_renter_id = Some(renter);

        self.borrowed.push(BorrowedItem {
            item_id: item_id.clone(),
            status: BorrowStatus::Renting,
            rent_date: now,
            period: range,
        });
        Ok(Notice::RentalRequested { item_id })
    }

    fn return_item(&mut self, item_id: String) -> anyhow::Result<Notice> {
        let user_id = self.current_user.id.clone();
        let renting = self
            .borrowed
            .iter()
            .any(|b| b.item_id == item_id && b.status == BorrowStatus::Renting);

        let item = self.item_mut(&item_id)?;
        if item.is_available {
            return Ok(Notice::NotRented { item_id });
        }
        if !renting && !item.is_owned_by(&user_id) {
            warn!(item_id = %item_id, user_id = %user_id, "return refused for non-renter");
            return Ok(Notice::NotRenter { item_id });
        }
        item.is_available = true;
        item.current_renter_id = None;

        for borrowed in self.borrowed.iter_mut().filter(|b| b.item_id == item_id) {
            borrowed.status = BorrowStatus::Returned;
        }
        Ok(Notice::Returned { item_id })
    }

    fn submit_review(&mut self, draft: ReviewDraft, now: DateTime<Utc>) -> anyhow::Result<Notice> {
        if let Err(err) = draft.validate() {
            return Ok(Notice::Invalid(err));
        }

        let review = Review {
            id: Uuid::new_v4().to_string(),
            item_id: draft.item_id.clone(),
            reviewer_name: self.current_user.short_name().to_string(),
            rating: draft.rating,
            content: draft.content.trim().to_string(),
            date: today_in(now, &self.tz),
            target: draft.target,
        };
        let item = self.item_mut(&draft.item_id)?;
        item.reviews.push(review);
        Ok(Notice::ReviewPosted {
            item_id: draft.item_id,
        })
    }

    fn toggle_favorite(&mut self, item_id: String, now: DateTime<Utc>) -> anyhow::Result<Notice> {
        self.require_item(&item_id)?;
        if self.is_favorite(&item_id) {
            self.favorites.retain(|fav| fav.item_id != item_id);
            return Ok(Notice::FavoriteRemoved { item_id });
        }
        self.favorites.push(FavoriteItem {
            item_id: item_id.clone(),
            added_at: now,
        });
        Ok(Notice::FavoriteAdded { item_id })
    }

    fn save_periods(
        &mut self,
        item_id: String,
        periods: Vec<AvailablePeriod>,
    ) -> anyhow::Result<Notice> {
        let user_id = self.current_user.id.clone();
        let item = self.item_mut(&item_id)?;
        if !item.is_owned_by(&user_id) {
            return Ok(Notice::NotOwner { item_id });
        }
        let count = periods.len();
        item.available_periods = periods;
        Ok(Notice::PeriodsSaved { item_id, count })
    }

    fn register_item(&mut self, form: ItemRegistrationForm) -> Notice {
        if let Err(err) = form.validate() {
            return Notice::Invalid(err);
        }

        let item_id = Uuid::new_v4().simple().to_string();
        self.items.push(RentalItem {
            id: item_id.clone(),
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            price_per_day: form.price_per_day.unsigned_abs(),
            owner_name: self.current_user.short_name().to_string(),
            owner_rating: self.current_user.rating,
            location: form.location,
            distance: 0.0,
            is_available: true,
            reviews: Vec::new(),
            image_url: form.image_url.trim().to_string(),
            owner_id: self.current_user.id.clone(),
            current_renter_id: None,
            available_periods: Vec::new(),
            reserved_times: Vec::new(),
            category: Some(form.category),
        });
        Notice::ItemRegistered { item_id }
    }

    fn send_message(&mut self, partner: String, content: String, now: DateTime<Utc>) -> Notice {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Notice::MessageSkipped;
        }

        let time = format_clock_label(now, &self.tz);
        let default_thread = &self.default_thread;
        let thread = self
            .threads
            .entry(partner.clone())
            .or_insert_with(|| default_thread.clone());
        thread.push(ChatMessage {
            id: thread.len() as u64 + 1,
            sender: Sender::Me,
            content: content.clone(),
            time: time.clone(),
        });

        if let Some(chat) = self.chats.iter_mut().find(|c| c.partner_name == partner) {
            chat.last_message = content;
            chat.last_message_time = time;
        }
        Notice::MessageSent { partner }
    }
}

/// Routes picker submissions into the store.
pub struct StoreBooking<'a> {
    store: &'a mut AppStore,
    now: DateTime<Utc>,
    notice: Option<Notice>,
}

impl<'a> StoreBooking<'a> {
    pub fn new(store: &'a mut AppStore, now: DateTime<Utc>) -> Self {
        Self {
            store,
            now,
            notice: None,
        }
    }

    pub fn into_notice(self) -> Option<Notice> {
        self.notice
    }
}

impl BookingHandler for StoreBooking<'_> {
    fn on_request(
        &mut self,
        item_id: &str,
        start: CalendarDay,
        end: CalendarDay,
    ) -> anyhow::Result<()> {
        let range = DateRange::new(start, end)
            .with_context(|| format!("booking range is reversed: {start} > {end}"))?;
        let notice = self.store.dispatch(
            Action::RequestRental {
                item_id: item_id.to_string(),
                range: Some(range),
            },
            self.now,
        )?;
        self.notice = Some(notice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::Category;
    use crate::picker::SubmitOutcome;
    use crate::seed;

    fn store() -> AppStore {
        AppStore::from_seed(seed::embedded().expect("seed"), chrono_tz::Asia::Seoul)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 20, 3, 0, 0)
            .single()
            .expect("valid now")
    }

    fn day(raw: &str) -> CalendarDay {
        raw.parse().expect("valid day")
    }

    #[test]
    fn search_matches_name_and_description_case_insensitively() {
        let store = store();
        assert_eq!(store.search("").len(), 6);
        assert_eq!(store.search("   ").len(), 6);

        let tents: Vec<&str> = store.search("텐트").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(tents, vec!["3"]);

        let diy: Vec<&str> = store.search("diy").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(diy, vec!["5"]);
        assert!(store.search("자전거").is_empty());
    }

    #[test]
    fn status_distinguishes_my_rentals() {
        let store = store();
        let switch = store.require_item("4").expect("switch");
        let fryer = store.require_item("2").expect("fryer");
        let monitor = store.require_item("1").expect("monitor");
        assert_eq!(store.item_status(switch), ItemStatus::RentedByMe);
        assert_eq!(store.item_status(fryer), ItemStatus::Rented);
        assert_eq!(store.item_status(monitor), ItemStatus::Available);
    }

    #[test]
    fn rental_then_return_round_trips_item_state() {
        let mut store = store();
        let notice = store
            .dispatch(
                Action::RequestRental {
                    item_id: "6".to_string(),
                    range: None,
                },
                now(),
            )
            .expect("request");
        assert_eq!(notice.to_string(), "대여 요청이 완료되었습니다!");

        let item = store.require_item("6").expect("item");
        assert!(!item.is_available);
        assert_eq!(item.current_renter_id.as_deref(), Some("jjanggu"));
        assert_eq!(store.item_status(item), ItemStatus::RentedByMe);

        let again = store
            .dispatch(
                Action::RequestRental {
                    item_id: "6".to_string(),
                    range: None,
                },
                now(),
            )
            .expect("second request");
        assert_eq!(
            again,
            Notice::Unavailable {
                item_id: "6".to_string()
            }
        );

        let returned = store
            .dispatch(
                Action::ReturnItem {
                    item_id: "6".to_string(),
                },
                now(),
            )
            .expect("return");
        assert_eq!(returned.to_string(), "반납이 완료되었습니다!");
        let item = store.require_item("6").expect("item");
        assert!(item.is_available);
        assert!(item.current_renter_id.is_none());
        assert!(
            store
                .borrowed()
                .iter()
                .filter(|b| b.item_id == "6")
                .all(|b| b.status == BorrowStatus::Returned)
        );
    }

    #[test]
    fn returning_an_available_item_is_rejected() {
        let mut store = store();
        let notice = store
            .dispatch(
                Action::ReturnItem {
                    item_id: "1".to_string(),
                },
                now(),
            )
            .expect("dispatch");
        assert!(notice.is_rejection());
    }

    #[test]
    fn only_renter_or_owner_may_return() {
        let mut store = store();
        let notice = store
            .dispatch(
                Action::ReturnItem {
                    item_id: "2".to_string(),
                },
                now(),
            )
            .expect("dispatch");
        assert_eq!(
            notice,
            Notice::NotRenter {
                item_id: "2".to_string()
            }
        );
        let item = store.require_item("2").expect("item");
        assert!(!item.is_available);
        assert_eq!(item.current_renter_id.as_deref(), Some("other"));

        let notice = store
            .dispatch(
                Action::ReturnItem {
                    item_id: "4".to_string(),
                },
                now(),
            )
            .expect("dispatch");
        assert_eq!(notice.to_string(), "반납이 완료되었습니다!");
    }

    #[test]
    fn owner_may_take_back_a_rented_item() {
        let mut store = store();
        let form = ItemRegistrationForm {
            name: "접이식 의자".to_string(),
            description: "캠핑용".to_string(),
            price_per_day: 1500,
            image_url: "https://example.com/chair.jpg".to_string(),
            ..ItemRegistrationForm::default()
        };
        store
            .dispatch(Action::RegisterItem(form), now())
            .expect("register");
        let item_id = store
            .owned_by("jjanggu")
            .last()
            .map(|item| item.id.clone())
            .expect("registered item");
        store.item_mut(&item_id).expect("item").is_available = false;

        let notice = store
            .dispatch(Action::ReturnItem { item_id }, now())
            .expect("dispatch");
        assert!(matches!(notice, Notice::Returned { .. }));
    }

    #[test]
    fn unknown_item_is_an_error() {
        let mut store = store();
        let err = store
            .dispatch(
                Action::ToggleFavorite {
                    item_id: "404".to_string(),
                },
                now(),
            )
            .expect_err("missing item");
        assert!(err.to_string().contains("item not found: 404"));
    }

    #[test]
    fn ranged_request_records_reservation() {
        let mut store = store();
        let range = DateRange::new(day("2024-06-25"), day("2024-06-27")).expect("range");
        store
            .dispatch(
                Action::RequestRental {
                    item_id: "1".to_string(),
                    range: Some(range),
                },
                now(),
            )
            .expect("request");

        let reserved = store.reserved_times("1").expect("reserved");
        assert_eq!(reserved.len(), 3);
        let borrowed = store.borrowed().last().expect("borrowed entry");
        assert_eq!(borrowed.period, Some(range));
    }

    #[test]
    fn ranged_request_over_reserved_day_conflicts() {
        let mut store = store();
        let range = DateRange::new(day("2024-06-21"), day("2024-06-23")).expect("range");
        let notice = store
            .dispatch(
                Action::RequestRental {
                    item_id: "1".to_string(),
                    range: Some(range),
                },
                now(),
            )
            .expect("dispatch");
        assert_eq!(
            notice,
            Notice::Conflict(SelectionError::RangeConflict {
                day: day("2024-06-22")
            })
        );
        assert!(store.require_item("1").expect("item").is_available);
    }

    #[test]
    fn favorites_toggle() {
        let mut store = store();
        let toggle = |store: &mut AppStore| {
            store
                .dispatch(
                    Action::ToggleFavorite {
                        item_id: "3".to_string(),
                    },
                    now(),
                )
                .expect("toggle")
        };
        assert!(matches!(toggle(&mut store), Notice::FavoriteAdded { .. }));
        assert!(store.is_favorite("3"));
        assert_eq!(store.favorites().len(), 1);
        assert!(matches!(toggle(&mut store), Notice::FavoriteRemoved { .. }));
        assert!(store.favorites().is_empty());
    }

    #[test]
    fn review_is_validated_and_dated_in_store_timezone() {
        let mut store = store();
        let mut draft = ReviewDraft::new("1");
        let notice = store
            .dispatch(Action::SubmitReview(draft.clone()), now())
            .expect("dispatch");
        assert_eq!(notice, Notice::Invalid(FormError::EmptyReview));

        draft.content = "  깨끗하게 잘 썼습니다  ".to_string();
        draft.rating = 4;
        draft.target = ReviewTarget::Owner;
        store
            .dispatch(Action::SubmitReview(draft), now())
            .expect("dispatch");

        let review = store
            .require_item("1")
            .expect("item")
            .reviews
            .last()
            .cloned()
            .expect("review");
        assert_eq!(review.reviewer_name, "짱구");
        assert_eq!(review.content, "깨끗하게 잘 썼습니다");
        assert_eq!(review.date, day("2024-06-20"));

        let profile = store.owner_profile("kimdev").expect("owner");
        assert_eq!(profile.owner.name, "김개발");
        assert_eq!(profile.reviews.len(), 1);
    }

    #[test]
    fn only_owner_may_save_periods() {
        let mut store = store();
        let periods =
            vec![AvailablePeriod::new(day("2024-07-01"), day("2024-07-10")).expect("period")];
        let notice = store
            .dispatch(
                Action::SavePeriods {
                    item_id: "1".to_string(),
                    periods: periods.clone(),
                },
                now(),
            )
            .expect("dispatch");
        assert!(matches!(notice, Notice::NotOwner { .. }));

        let mut form = ItemRegistrationForm {
            name: "빔 프로젝터".to_string(),
            description: "가정용 빔 프로젝터".to_string(),
            price_per_day: 9000,
            category: Category::Digital,
            image_url: "https://example.com/beam.jpg".to_string(),
            ..ItemRegistrationForm::default()
        };
        form.set_location(37.55, 126.99, "서울특별시 중구");
        let Notice::ItemRegistered { item_id } = store
            .dispatch(Action::RegisterItem(form), now())
            .expect("register")
        else {
            panic!("expected registration");
        };
        assert_eq!(store.owned_by("jjanggu").len(), 1);

        let notice = store
            .dispatch(
                Action::SavePeriods {
                    item_id: item_id.clone(),
                    periods,
                },
                now(),
            )
            .expect("dispatch");
        assert_eq!(notice, Notice::PeriodsSaved { item_id, count: 1 });
    }

    #[test]
    fn invalid_registration_adds_nothing() {
        let mut store = store();
        let notice = store
            .dispatch(Action::RegisterItem(ItemRegistrationForm::default()), now())
            .expect("dispatch");
        assert_eq!(notice, Notice::Invalid(FormError::MissingName));
        assert_eq!(store.items().len(), 6);
    }

    #[test]
    fn messages_extend_thread_and_chat_list() {
        let mut store = store();
        assert_eq!(store.thread("정게임").len(), 5);

        let skipped = store
            .dispatch(
                Action::SendMessage {
                    partner: "정게임".to_string(),
                    content: "   ".to_string(),
                },
                now(),
            )
            .expect("dispatch");
        assert_eq!(skipped, Notice::MessageSkipped);
        assert_eq!(store.thread("정게임").len(), 5);

        store
            .dispatch(
                Action::SendMessage {
                    partner: "정게임".to_string(),
                    content: "내일 반납할게요".to_string(),
                },
                now(),
            )
            .expect("dispatch");
        let thread = store.thread("정게임");
        assert_eq!(thread.len(), 6);
        assert_eq!(thread[5].sender, Sender::Me);
        assert_eq!(thread[5].time, "12:00");
        assert_eq!(store.chats()[0].last_message, "내일 반납할게요");
    }

    #[test]
    fn picker_submission_books_through_store() {
        let mut store = store();
        let mut picker = store
            .open_picker("5", WeekStart::Sunday, day("2024-06-18"))
            .expect("picker");
        picker.click(day("2024-06-24"));
        picker.click(day("2024-06-25"));

        let mut booking = StoreBooking::new(&mut store, now());
        let outcome = picker.submit(&mut booking).expect("submit");
        assert!(matches!(outcome, SubmitOutcome::Requested(_)));
        assert!(matches!(
            booking.into_notice(),
            Some(Notice::RentalRequested { .. })
        ));
        assert!(!store.require_item("5").expect("item").is_available);
    }

    #[test]
    fn closed_policy_rejects_items_without_periods() {
        let mut store = store().with_period_policy(PeriodPolicy::ClosedWhenUndeclared);
        let range = DateRange::new(day("2024-06-25"), day("2024-06-26")).expect("range");
        let notice = store
            .dispatch(
                Action::RequestRental {
                    item_id: "6".to_string(),
                    range: Some(range),
                },
                now(),
            )
            .expect("dispatch");
        assert_eq!(
            notice,
            Notice::Conflict(SelectionError::RangeConflict {
                day: day("2024-06-25")
            })
        );
    }

    #[test]
    fn point_summary_matches_seed() {
        let store = store();
        let summary = store.point_summary();
        assert_eq!(summary.earned, 45_000);
        assert_eq!(summary.spent, 17_000);
        assert_eq!(summary.balance(), 28_000);
    }
}
