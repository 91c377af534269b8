// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity category normalization, label localization and icons.
//!
//! All tables are plain data built once at startup and passed into the
//! mapper; nothing here is process-wide state.

use std::collections::HashMap;

/// A normalized (category, subcategory) pair, in canonical English.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub category: String,
    pub subcategory: String,
}

impl Category {
    fn new(category: &str, subcategory: &str) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        }
    }
}

/// Keyword in an activity name that overrides the tag classification.
#[derive(Debug, Clone)]
pub struct NameOverride {
    /// Matched case-insensitively as a substring
    pub keyword: String,
    pub category: Category,
}

/// Maps free-form type tags to a closed set of categories.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    /// Formatted subtype → category
    groups: HashMap<String, String>,
    name_overrides: Vec<NameOverride>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let groups = [
            ("Barre", "Strength"),
            ("Indoor Cardio", "Cardio"),
            ("Indoor Cycling", "Cycling"),
            ("Indoor Rowing", "Rowing"),
            ("Speed Walking", "Walking"),
            ("Strength Training", "Strength"),
            ("Treadmill Running", "Running"),
            ("Rowing V2", "Rowing"),
            ("Yoga", "Yoga/Pilates"),
            ("Pilates", "Yoga/Pilates"),
        ];
        let overrides = [
            ("meditation", "Meditation", "Meditation"),
            ("barre", "Strength", "Barre"),
            ("stretch", "Stretching", "Stretching"),
        ];

        Self {
            groups: groups
                .iter()
                .map(|(sub, cat)| (sub.to_string(), cat.to_string()))
                .collect(),
            name_overrides: overrides
                .iter()
                .map(|(keyword, cat, sub)| NameOverride {
                    keyword: keyword.to_string(),
                    category: Category::new(cat, sub),
                })
                .collect(),
        }
    }
}

impl CategoryTable {
    pub fn new(groups: HashMap<String, String>, name_overrides: Vec<NameOverride>) -> Self {
        Self {
            groups,
            name_overrides,
        }
    }

    /// Classify an activity by its type tag, with name keyword overrides.
    pub fn classify(&self, type_tag: &str, name: &str) -> Category {
        let lowered = name.to_lowercase();
        if let Some(o) = self
            .name_overrides
            .iter()
            .find(|o| lowered.contains(&o.keyword))
        {
            return o.category.clone();
        }

        let formatted = title_case_tag(type_tag);
        let category = self
            .groups
            .get(&formatted)
            .cloned()
            .unwrap_or_else(|| formatted.clone());
        Category {
            category,
            subcategory: formatted,
        }
    }
}

/// `"indoor_cycling"` → `"Indoor Cycling"`; empty → `"Unknown"`.
pub fn title_case_tag(tag: &str) -> String {
    let words: Vec<String> = tag
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Unknown".to_string()
    } else {
        words.join(" ")
    }
}

/// Translates canonical labels into the destination's vocabulary.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: HashMap<String, String>,
}

impl LabelTable {
    /// Pass-through table.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Labels used by the Japanese destination databases.
    pub fn japanese() -> Self {
        let pairs = [
            // Categories
            ("Running", "ランニング"),
            ("Cycling", "サイクリング"),
            ("Walking", "ウォーキング"),
            ("Strength", "筋トレ"),
            ("Yoga/Pilates", "ヨガ/ピラティス"),
            ("Stretching", "ストレッチ"),
            ("Meditation", "瞑想"),
            ("Swimming", "スイミング"),
            ("Rowing", "ローイング"),
            ("Hiking", "ハイキング"),
            ("Cardio", "有酸素運動"),
            ("Treadmill Running", "トレッドミル"),
            ("Indoor Cycling", "室内サイクリング"),
            ("Indoor Rowing", "室内ローイング"),
            ("Indoor Cardio", "室内カーディオ"),
            ("Yoga", "ヨガ"),
            ("Pilates", "ピラティス"),
            ("Barre", "バー"),
            ("Breathwork", "呼吸法"),
            // Training effect labels
            ("Recovery", "リカバリー"),
            ("Aerobic Base", "ベース"),
            ("Base", "ベース"),
            ("Tempo", "テンポ"),
            ("Lactate Threshold", "乳酸閾値"),
            ("Threshold", "閾値"),
            ("Speed", "スピード"),
            ("Anaerobic", "無酸素"),
            ("Sprint", "スプリント"),
            ("Vo2 Max", "VO2max"),
            ("Maintaining", "維持"),
            ("Improving", "向上"),
            ("Impacting", "影響あり"),
            ("Highly Impacting", "高い影響"),
            ("Overreaching", "オーバーリーチ"),
            ("No Benefit", "効果なし"),
            ("Minor Benefit", "わずかな効果"),
            ("Unknown", "不明"),
            ("Untitled Activity", "無題のアクティビティ"),
        ];
        Self {
            labels: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Localized label, or the input when no translation exists.
    pub fn label(&self, canonical: &str) -> String {
        self.labels
            .get(canonical)
            .cloned()
            .unwrap_or_else(|| canonical.to_string())
    }

    /// Canonical label for a localized one, or the input.
    pub fn canonical(&self, label: &str) -> String {
        self.labels
            .iter()
            .find(|(_, v)| v.as_str() == label)
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| label.to_string())
    }
}

/// Icon URL per canonical category or subcategory.
#[derive(Debug, Clone, Default)]
pub struct IconTable {
    icons: HashMap<String, String>,
}

impl IconTable {
    pub fn standard() -> Self {
        let icon = |id: &str| format!("https://img.icons8.com/?size=100&id={id}&format=png&color=000000");
        let pairs = [
            ("Barre", icon("66924")),
            ("Breathwork", icon("9798")),
            ("Cardio", icon("71221")),
            ("Cycling", icon("47443")),
            ("Hiking", icon("9844")),
            ("Indoor Cardio", icon("62779")),
            ("Indoor Cycling", icon("47443")),
            ("Indoor Rowing", icon("71098")),
            ("Pilates", icon("9774")),
            ("Meditation", icon("9798")),
            ("Rowing", icon("71491")),
            ("Running", icon("k1l1XFkME39t")),
            ("Strength", icon("107640")),
            ("Stretching", icon("djfOcRn1m_kh")),
            ("Swimming", icon("9777")),
            ("Treadmill Running", icon("9794")),
            ("Walking", icon("9807")),
            ("Yoga", icon("9783")),
            ("Yoga/Pilates", icon("9783")),
        ];
        Self {
            icons: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Icon for the subcategory when it is more specific, else the category.
    pub fn lookup(&self, category: &Category) -> Option<&str> {
        let key = if category.subcategory != category.category {
            &category.subcategory
        } else {
            &category.category
        };
        self.icons.get(key).map(String::as_str)
    }
}

/// Canonical label for a training effect label such as `AEROBIC_BASE`.
pub fn training_effect_label(raw: Option<&str>) -> String {
    title_case_tag(raw.unwrap_or("Unknown"))
}

/// Canonical label for a training effect message such as
/// `IMPROVING_AEROBIC_BASE_8`.
pub fn training_effect_message(raw: Option<&str>) -> String {
    const PREFIXES: &[(&str, &str)] = &[
        ("NO_", "No Benefit"),
        ("MINOR_", "Minor Benefit"),
        ("RECOVERY_", "Recovery"),
        ("MAINTAINING_", "Maintaining"),
        ("IMPROVING_", "Improving"),
        ("IMPACTING_", "Impacting"),
        ("HIGHLY_", "Highly Impacting"),
        ("OVERREACHING_", "Overreaching"),
    ];
    let raw = raw.unwrap_or("Unknown");
    PREFIXES
        .iter()
        .find(|(prefix, _)| raw.starts_with(prefix))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| raw.to_string())
}
