use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono_tz::Tz;
use unicode_width::UnicodeWidthStr;

use crate::availability::AvailablePeriod;
use crate::config::Config;
use crate::datetime::format_timestamp_label;
use crate::model::{ChatItem, ChatMessage, ItemStatus, PointKind, RentalItem, Review, Sender};
use crate::picker::{CellMark, MonthView, RentalPicker};
use crate::selection::Selection;
use crate::store::{AppStore, Notice, OwnerProfile};

const CELL_WIDTH: usize = 4;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
}

impl Renderer {
    pub fn new(cfg: &Config, tz: Tz) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            tz,
        })
    }

    #[tracing::instrument(skip(self, out, store, items))]
    pub fn print_item_table<W: Write>(
        &self,
        out: &mut W,
        store: &AppStore,
        items: &[&RentalItem],
    ) -> anyhow::Result<()> {
        if items.is_empty() {
            writeln!(out, "검색 결과가 없습니다.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "물품".to_string(),
            "가격".to_string(),
            "거리".to_string(),
            "대여자".to_string(),
            "상태".to_string(),
        ];

        let rows = items
            .iter()
            .map(|item| {
                let mut name = item.name.clone();
                if store.is_favorite(&item.id) {
                    name.push_str(" ♥");
                }
                vec![
                    self.paint(&item.id, "33"),
                    name,
                    format!("{}원/일", group_thousands(item.price_per_day)),
                    format!("{:.1}km", item.distance),
                    format!("{} ★{:.1}", item.owner_name, item.owner_rating),
                    self.status_cell(store.item_status(item)),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, store, item), fields(item_id = %item.id))]
    pub fn print_item_detail<W: Write>(
        &self,
        out: &mut W,
        store: &AppStore,
        item: &RentalItem,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&item.name, "1"))?;
        writeln!(out, "{}", item.description)?;
        writeln!(out)?;
        writeln!(
            out,
            "가격      {}포인트/일",
            group_thousands(item.price_per_day)
        )?;
        if let Some(category) = item.category {
            writeln!(out, "분류      {}", category.label())?;
        }
        writeln!(
            out,
            "대여자    {} (★{:.1})",
            item.owner_name, item.owner_rating
        )?;
        writeln!(out, "거리      {:.1}km", item.distance)?;
        if let Some(address) = &item.location.address {
            writeln!(out, "위치      {address}")?;
        }
        writeln!(out, "상태      {}", self.status_cell(store.item_status(item)))?;
        if store.is_favorite(&item.id) {
            writeln!(out, "관심      ♥")?;
        }

        if !item.available_periods.is_empty() {
            writeln!(out, "대여 가능 기간")?;
            self.print_periods(out, &item.available_periods)?;
        }

        writeln!(out)?;
        match item.average_item_rating() {
            Some(avg) => writeln!(out, "리뷰 ({}) ★{avg:.1}", item.reviews.len())?,
            None => writeln!(out, "리뷰 ({})", item.reviews.len())?,
        }
        let reviews: Vec<&Review> = item.reviews.iter().collect();
        self.print_reviews(out, &reviews)
    }

    pub fn print_periods<W: Write>(
        &self,
        out: &mut W,
        periods: &[AvailablePeriod],
    ) -> anyhow::Result<()> {
        if periods.is_empty() {
            writeln!(out, "  설정된 기간이 없습니다. (항상 대여 가능)")?;
        }
        for (idx, period) in periods.iter().enumerate() {
            writeln!(out, "  {}. {} ~ {}", idx + 1, period.start(), period.end())?;
        }
        Ok(())
    }

    fn print_reviews<W: Write>(&self, out: &mut W, reviews: &[&Review]) -> anyhow::Result<()> {
        if reviews.is_empty() {
            writeln!(out, "  아직 리뷰가 없습니다.")?;
        }
        for review in reviews {
            writeln!(
                out,
                "  {} {} [{}] {}",
                self.paint(&stars(review.rating), "33"),
                review.reviewer_name,
                review.target.label(),
                review.date
            )?;
            writeln!(out, "    {}", review.content)?;
        }
        Ok(())
    }

    /// Month grid plus the current selection and any submit error.
    #[tracing::instrument(skip(self, out, picker), fields(item_id = %picker.item_id()))]
    pub fn print_picker<W: Write>(&self, out: &mut W, picker: &RentalPicker) -> anyhow::Result<()> {
        let view = picker.month_view()?;
        for line in month_lines(&view) {
            writeln!(out, "{}", self.colorize_line(&line))?;
        }
        writeln!(out, "[ ] 선택  ( ) 기간 내  x 예약 불가")?;

        match picker.selection() {
            Selection::Empty => writeln!(out, "시작일을 선택하세요.")?,
            Selection::StartOnly { start } => {
                writeln!(out, "시작일 {start} / 종료일을 선택하세요.")?
            }
            Selection::Complete { start, end } => writeln!(out, "선택 기간 {start} ~ {end}")?,
        }
        if let Some(err) = picker.error() {
            writeln!(out, "{}", self.paint(&err.to_string(), "31"))?;
        }
        Ok(())
    }

    pub fn print_borrowed<W: Write>(&self, out: &mut W, store: &AppStore) -> anyhow::Result<()> {
        if store.borrowed().is_empty() {
            writeln!(out, "대여한 물품이 없습니다.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "물품".to_string(),
            "대여일".to_string(),
            "기간".to_string(),
            "상태".to_string(),
        ];
        let rows = store
            .borrowed()
            .iter()
            .map(|borrowed| {
                let name = store
                    .item(&borrowed.item_id)
                    .map(|item| item.name.clone())
                    .unwrap_or_else(|| "-".to_string());
                let period = borrowed
                    .period
                    .map(|range| range.to_string())
                    .unwrap_or_default();
                vec![
                    self.paint(&borrowed.item_id, "33"),
                    name,
                    format_timestamp_label(borrowed.rent_date, &self.tz),
                    period,
                    borrowed.status.label().to_string(),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    pub fn print_profile<W: Write>(&self, out: &mut W, store: &AppStore) -> anyhow::Result<()> {
        let user = store.current_user();
        writeln!(out, "{}", self.paint(&user.name, "1"))?;
        if !user.occupation.is_empty() {
            writeln!(out, "{}", user.occupation)?;
        }
        writeln!(
            out,
            "★{:.1} · 거래 {}회 · 포인트 {}",
            user.rating,
            user.total_transactions,
            group_signed(store.point_summary().balance())
        )?;

        writeln!(out)?;
        writeln!(out, "관심 품목")?;
        let favorites = store.favorites();
        if favorites.is_empty() {
            writeln!(out, "  관심 품목이 없습니다.")?;
        } else {
            self.print_item_table(out, store, &favorites)?;
        }

        writeln!(out)?;
        writeln!(out, "내 물품")?;
        let owned = store.owned_by(&user.id);
        if owned.is_empty() {
            writeln!(out, "  등록한 물품이 없습니다.")?;
            return Ok(());
        }
        self.print_item_table(out, store, &owned)
    }

    pub fn print_owner<W: Write>(
        &self,
        out: &mut W,
        store: &AppStore,
        profile: &OwnerProfile<'_>,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} (★{:.1})",
            self.paint(&profile.owner.name, "1"),
            profile.owner.rating
        )?;
        writeln!(out)?;
        writeln!(out, "대여 물품 ({})", profile.items.len())?;
        self.print_item_table(out, store, &profile.items)?;
        writeln!(out)?;
        writeln!(out, "대여자 리뷰 ({})", profile.reviews.len())?;
        self.print_reviews(out, &profile.reviews)
    }

    pub fn print_points<W: Write>(&self, out: &mut W, store: &AppStore) -> anyhow::Result<()> {
        let summary = store.point_summary();
        writeln!(out, "보유 포인트 {} 포인트", group_signed(summary.balance()))?;
        writeln!(
            out,
            "적립 {}  사용 {}",
            self.paint(&format!("+{}", group_thousands(summary.earned)), "32"),
            self.paint(&format!("-{}", group_thousands(summary.spent)), "31"),
        )?;
        writeln!(out)?;

        let mut history: Vec<_> = store.point_history().iter().collect();
        history.sort_by(|a, b| b.date.cmp(&a.date));

        let headers = vec!["일시".to_string(), "내역".to_string(), "포인트".to_string()];
        let rows = history
            .into_iter()
            .map(|tx| {
                let amount = match tx.kind {
                    PointKind::Earned => {
                        self.paint(&format!("+{}", group_thousands(tx.amount)), "32")
                    }
                    PointKind::Spent => {
                        self.paint(&format!("-{}", group_thousands(tx.amount)), "31")
                    }
                };
                vec![
                    format_timestamp_label(tx.date, &self.tz),
                    tx.description.clone(),
                    amount,
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    pub fn print_chats<W: Write>(&self, out: &mut W, chats: &[ChatItem]) -> anyhow::Result<()> {
        if chats.is_empty() {
            writeln!(out, "채팅이 없습니다.")?;
            return Ok(());
        }
        let headers = vec![
            "상대".to_string(),
            "최근 메시지".to_string(),
            "시간".to_string(),
            "물품".to_string(),
        ];
        let rows = chats
            .iter()
            .map(|chat| {
                vec![
                    self.paint(&chat.partner_name, "1"),
                    chat.last_message.clone(),
                    chat.last_message_time.clone(),
                    chat.related_item_id.clone(),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    pub fn print_thread<W: Write>(
        &self,
        out: &mut W,
        partner: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(partner, "1"))?;
        for message in messages {
            match message.sender {
                Sender::Me => writeln!(out, "{:>40}  {}", message.content, message.time)?,
                Sender::Partner => writeln!(out, "{}  {}", message.content, message.time)?,
            }
        }
        Ok(())
    }

    pub fn print_notice<W: Write>(&self, out: &mut W, notice: &Notice) -> anyhow::Result<()> {
        let code = if notice.is_rejection() { "31" } else { "32" };
        writeln!(out, "{}", self.paint(&notice.to_string(), code))?;
        Ok(())
    }

    fn status_cell(&self, status: ItemStatus) -> String {
        let code = match status {
            ItemStatus::Available => "32",
            ItemStatus::Rented => "31",
            ItemStatus::RentedByMe => "36",
        };
        self.paint(status.label(), code)
    }

    fn colorize_line(&self, line: &str) -> String {
        if !self.color {
            return line.to_string();
        }
        line.replace('x', "\x1b[2mx\x1b[0m")
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Text rows of a month grid: title, weekday header, then one row per week.
pub fn month_lines(view: &MonthView) -> Vec<String> {
    let mut lines = vec![format!("{}년 {}월", view.year, view.month)];

    let header: String = view.labels.iter().map(|label| pad_cell(label)).collect();
    lines.push(header.trim_end().to_string());

    for week in &view.weeks {
        let row: String = week
            .iter()
            .map(|slot| match slot {
                Some(cell) => day_cell(cell.day.day(), cell.mark),
                None => "    ".to_string(),
            })
            .collect();
        lines.push(row.trim_end().to_string());
    }
    lines
}

fn day_cell(day: u32, mark: CellMark) -> String {
    match mark {
        CellMark::Open => format!(" {day:>2} "),
        CellMark::Endpoint => format!("[{day:>2}]"),
        CellMark::InRange => format!("({day:>2})"),
        CellMark::Blocked(_) => format!(" {day:>2}x"),
    }
}

fn pad_cell(label: &str) -> String {
    let width = UnicodeWidthStr::width(label);
    let left = CELL_WIDTH.saturating_sub(width) / 2;
    let right = CELL_WIDTH.saturating_sub(width + left);
    format!("{}{label}{}", " ".repeat(left), " ".repeat(right))
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn group_signed(value: i64) -> String {
    let grouped = group_thousands(value.unsigned_abs());
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(header.as_str()));
        write!(writer, "{header}{} ", " ".repeat(padding))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
