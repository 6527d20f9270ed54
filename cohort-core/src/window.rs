use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Khoảng đóng `[start, end]` neo tại thời điểm nhập đơn vị.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Cửa sổ `hours` giờ mở tại `start`. Điểm cuối bị chặn ở
    /// `NaiveDateTime::MAX` khi phép cộng tràn.
    pub fn anchored(start: NaiveDateTime, hours: u32) -> Self {
        let end = start
            .checked_add_signed(Duration::hours(i64::from(hours)))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}
