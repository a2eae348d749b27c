use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use std::sync::{Mutex, PoisonError};

/// ストア側の時刻源（サーバータイムスタンプ）
///
/// マイクロ秒精度で、同一インスタンス内では発行ごとに必ず増加します。
#[derive(Debug, Default)]
pub struct ServerClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let issued = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(issued);
        issued
    }

    /// 保存用の文字列形式で現在時刻を発行
    pub fn now_string(&self) -> String {
        format_timestamp(self.now())
    }
}

/// 固定長の RFC 3339 文字列（辞書順 = 時刻順）
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
