use thiserror::Error;

use crate::model::{Category, Location, ReviewTarget};

pub const DEFAULT_LATITUDE: f64 = 37.5665;
pub const DEFAULT_LONGITUDE: f64 = 126.9780;
pub const DEFAULT_ADDRESS: &str = "서울특별시 중구 세종대로 110";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Form validation failures. The display text is what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("물품명을 입력해주세요.")]
    MissingName,

    #[error("물품 설명을 입력해주세요.")]
    MissingDescription,

    #[error("올바른 가격을 입력해주세요.")]
    InvalidPrice,

    #[error("이미지 URL을 입력해주세요.")]
    MissingImageUrl,

    #[error("리뷰 내용을 입력해주세요.")]
    EmptyReview,

    #[error("별점은 1점에서 5점 사이여야 합니다.")]
    RatingOutOfRange,

    #[error("시작일과 종료일을 모두 선택하세요.")]
    PeriodIncomplete,

    #[error("종료일이 시작일보다 빠를 수 없습니다.")]
    PeriodEndBeforeStart,
}

/// Seoul City Hall.
pub fn default_location() -> Location {
    Location {
        lat: DEFAULT_LATITUDE,
        lng: DEFAULT_LONGITUDE,
        address: Some(DEFAULT_ADDRESS.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    Lat,
    Lng,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRegistrationForm {
    pub name: String,
    pub description: String,
    pub price_per_day: i64,
    pub category: Category,
    pub image_url: String,
    pub location: Location,
}

impl Default for ItemRegistrationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price_per_day: 0,
            category: Category::default(),
            image_url: String::new(),
            location: default_location(),
        }
    }
}

impl ItemRegistrationForm {
    /// Manual coordinate entry. Unparsable input leaves the field as is.
    pub fn set_coordinate(&mut self, field: CoordinateField, raw: &str) -> bool {
        let Ok(value) = raw.trim().parse::<f64>() else {
            return false;
        };
        if !value.is_finite() {
            return false;
        }
        match field {
            CoordinateField::Lat => self.location.lat = value,
            CoordinateField::Lng => self.location.lng = value,
        }
        true
    }

    /// A location chosen on the map picker.
    pub fn set_location(&mut self, lat: f64, lng: f64, address: impl Into<String>) {
        self.location = Location {
            lat,
            lng,
            address: Some(address.into()),
        };
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::MissingName);
        }
        if self.description.trim().is_empty() {
            return Err(FormError::MissingDescription);
        }
        if self.price_per_day <= 0 {
            return Err(FormError::InvalidPrice);
        }
        if self.image_url.trim().is_empty() {
            return Err(FormError::MissingImageUrl);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub item_id: String,
    pub rating: u8,
    pub content: String,
    pub target: ReviewTarget,
}

impl ReviewDraft {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            rating: MAX_RATING,
            content: String::new(),
            target: ReviewTarget::default(),
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.content.trim().is_empty() {
            return Err(FormError::EmptyReview);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(FormError::RatingOutOfRange);
        }
        Ok(())
    }
}
