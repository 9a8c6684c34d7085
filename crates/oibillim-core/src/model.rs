use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{AvailablePeriod, ReservedInterval};
use crate::calendar::{CalendarDay, DateRange};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Category {
    #[serde(rename = "디지털")]
    Digital,
    #[default]
    #[serde(rename = "생활용품")]
    Household,
    #[serde(rename = "공간대여")]
    Space,
    #[serde(rename = "인력대여")]
    Labor,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Digital => "디지털",
            Self::Household => "생활용품",
            Self::Space => "공간대여",
            Self::Labor => "인력대여",
        }
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "디지털" | "digital" => Ok(Self::Digital),
            "생활용품" | "household" => Ok(Self::Household),
            "공간대여" | "space" => Ok(Self::Space),
            "인력대여" | "labor" => Ok(Self::Labor),
            other => Err(anyhow::anyhow!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReviewTarget {
    #[serde(rename = "대여자")]
    Owner,
    #[default]
    #[serde(rename = "대여 물품")]
    Item,
}

impl ReviewTarget {
    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "대여자",
            Self::Item => "대여 물품",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub item_id: String,
    pub reviewer_name: String,
    pub rating: u8,
    pub content: String,
    pub date: CalendarDay,
    #[serde(default)]
    pub target: ReviewTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RentalItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_per_day: u64,
    pub owner_name: String,
    pub owner_rating: f64,
    pub location: Location,
    /// Kilometres from the current user.
    pub distance: f64,
    pub is_available: bool,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub image_url: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_renter_id: Option<String>,
    #[serde(default)]
    pub available_periods: Vec<AvailablePeriod>,
    #[serde(default)]
    pub reserved_times: Vec<ReservedInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl RentalItem {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }

    /// Mean rating of reviews about the item itself.
    pub fn average_item_rating(&self) -> Option<f64> {
        let ratings: Vec<f64> = self
            .reviews
            .iter()
            .filter(|r| r.target == ReviewTarget::Item)
            .map(|r| f64::from(r.rating))
            .collect();
        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Available,
    Rented,
    RentedByMe,
}

impl ItemStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "대여 가능",
            Self::Rented => "대여 중",
            Self::RentedByMe => "대여 중 (나)",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BorrowStatus {
    #[serde(rename = "대여 중")]
    Renting,
    #[serde(rename = "반납 완료")]
    Returned,
}

impl BorrowStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Renting => "대여 중",
            Self::Returned => "반납 완료",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedItem {
    pub item_id: String,
    pub status: BorrowStatus,
    pub rent_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<DateRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatItem {
    pub partner_name: String,
    pub last_message: String,
    pub last_message_time: String,
    pub related_item_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Partner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub content: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub occupation: String,
    pub rating: f64,
    #[serde(default)]
    pub total_transactions: u32,
    #[serde(default)]
    pub profile_image: String,
}

impl User {
    /// `짱구 (Jjanggu)` -> `짱구`
    pub fn short_name(&self) -> &str {
        self.name
            .split_once(" (")
            .map(|(head, _)| head)
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub item_id: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Earned,
    Spent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub amount: u64,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_item_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointSummary {
    pub earned: u64,
    pub spent: u64,
}

impl PointSummary {
    pub fn from_transactions(transactions: &[PointTransaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |mut acc, tx| {
                match tx.kind {
                    PointKind::Earned => acc.earned += tx.amount,
                    PointKind::Spent => acc.spent += tx.amount,
                }
                acc
            })
    }

    pub fn balance(&self) -> i64 {
        self.earned as i64 - self.spent as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_romanization() {
        let user = User {
            id: "jjanggu".to_string(),
            name: "짱구 (Jjanggu)".to_string(),
            occupation: String::new(),
            rating: 4.9,
            total_transactions: 0,
            profile_image: String::new(),
        };
        assert_eq!(user.short_name(), "짱구");
    }

    #[test]
    fn review_target_uses_korean_labels_on_the_wire() {
        let json = serde_json::to_string(&ReviewTarget::Owner).expect("serialize");
        assert_eq!(json, "\"대여자\"");
        let parsed: BorrowStatus = serde_json::from_str("\"반납 완료\"").expect("deserialize");
        assert_eq!(parsed, BorrowStatus::Returned);
    }

    #[test]
    fn point_summary_balances_earned_and_spent() {
        let now = Utc::now();
        let txs = vec![
            PointTransaction {
                id: "1".to_string(),
                kind: PointKind::Earned,
                amount: 10_000,
                description: "대여 수익".to_string(),
                date: now,
                related_item_id: None,
            },
            PointTransaction {
                id: "2".to_string(),
                kind: PointKind::Spent,
                amount: 12_000,
                description: "대여료".to_string(),
                date: now,
                related_item_id: Some("4".to_string()),
            },
        ];
        let summary = PointSummary::from_transactions(&txs);
        assert_eq!(summary.earned, 10_000);
        assert_eq!(summary.spent, 12_000);
        assert_eq!(summary.balance(), -2_000);
    }
}
