//! Destination store layer (Notion).

pub mod memory;
pub mod notion;

pub use memory::MemoryStore;
pub use notion::NotionStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{DestinationRecord, Fields, NewRecord, Query};

/// A schema-on-write record store with filtered queries and
/// create/update-by-id.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Return every record matching the query, following pagination.
    async fn query(&self, query: &Query) -> Result<Vec<DestinationRecord>, StoreError>;

    /// Create a record and return it as stored.
    async fn create(&self, record: &NewRecord) -> Result<DestinationRecord, StoreError>;

    /// Overwrite the given fields on a record; other fields are untouched.
    async fn update(&self, id: &str, fields: &Fields) -> Result<DestinationRecord, StoreError>;
}

/// Property names as constants.
///
/// The destination databases were created with Japanese column names.
pub mod properties {
    pub const DATE: &str = "日付";
    pub const CATEGORY: &str = "種目";
    pub const SUBCATEGORY: &str = "詳細種目";
    pub const NAME: &str = "アクティビティ名";
    pub const DISTANCE_KM: &str = "距離 (km)";
    pub const DURATION_MIN: &str = "タイム (分)";
    pub const CALORIES: &str = "カロリー";
    pub const AVERAGE_PACE: &str = "平均ペース";
    pub const GAP: &str = "GAP";
    pub const AVERAGE_HR: &str = "平均心拍";
    pub const MAX_HR: &str = "最大心拍";
    pub const AVERAGE_POWER: &str = "平均パワー";
    pub const MAX_POWER: &str = "最大パワー";
    pub const TRAINING_EFFECT: &str = "トレーニング効果";
    pub const AEROBIC: &str = "有酸素";
    pub const AEROBIC_EFFECT: &str = "有酸素効果";
    pub const ANAEROBIC: &str = "無酸素";
    pub const ANAEROBIC_EFFECT: &str = "無酸素効果";
    pub const LAPS: &str = "ラップ";
    pub const PERSONAL_RECORD: &str = "自己ベスト";
    pub const FAVORITE: &str = "お気に入り";
    pub const COACH_ADVICE: &str = "AIコーチのアドバイス";

    /// Daily conditions database
    pub mod daily {
        use crate::models::FieldKind;

        pub const TITLE: &str = "名前";
        pub const DATE: &str = "日付";
        pub const HRV: &str = "HRV";
        pub const RESTING_HR: &str = "安静時心拍";
        pub const SLEEP_SCORE: &str = "睡眠スコア";
        pub const STEPS: &str = "歩数";
        pub const STEP_GOAL: &str = "目標歩数";
        pub const WALK_DISTANCE_KM: &str = "歩行距離 (km)";

        /// Full schema of the database.
        pub const COLUMNS: [(&str, FieldKind); 8] = [
            (TITLE, FieldKind::Title),
            (DATE, FieldKind::Date),
            (HRV, FieldKind::Number),
            (RESTING_HR, FieldKind::Number),
            (SLEEP_SCORE, FieldKind::Number),
            (STEPS, FieldKind::Number),
            (STEP_GOAL, FieldKind::Number),
            (WALK_DISTANCE_KM, FieldKind::Number),
        ];
    }

    /// Weekly report database
    pub mod report {
        use crate::models::FieldKind;

        pub const TITLE: &str = "タイトル";
        pub const WEEK: &str = "対象週";
        pub const DISTANCE_KM: &str = "総走行距離 (km)";
        pub const AVERAGE_HR: &str = "平均心拍";
        pub const AVERAGE_HRV: &str = "平均HRV";
        pub const NOTES: &str = "所感";

        /// Full schema of the database.
        pub const COLUMNS: [(&str, FieldKind); 6] = [
            (TITLE, FieldKind::Title),
            (WEEK, FieldKind::Date),
            (DISTANCE_KM, FieldKind::Number),
            (AVERAGE_HR, FieldKind::Number),
            (AVERAGE_HRV, FieldKind::Number),
            (NOTES, FieldKind::Text),
        ];
    }
}

/// Maximum characters Notion accepts in one rich-text item.
pub const MAX_TEXT_CHARS: usize = 2000;
