//! Vocabulary - словарь: muscle groups, scheme types and the surface forms
//! recognised in workout notes (Russian and English)

use std::ops::{Index, IndexMut};
use std::sync::LazyLock;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Muscle groups reported by exercise enrichment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum MuscleGroup {
    Shoulders, // Плечи
    Chest,     // Грудь
    Back,      // Спина
    Core,      // Пресс, кор
    Legs,      // Ноги
    Arms,      // Руки
    FullBody,  // Всё тело
}

impl MuscleGroup {
    pub const COUNT: usize = 7;

    /// Fixed vocabulary order, also the tie-break order for the primary group
    pub const ALL: [MuscleGroup; Self::COUNT] = [
        MuscleGroup::Shoulders,
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Core,
        MuscleGroup::Legs,
        MuscleGroup::Arms,
        MuscleGroup::FullBody,
    ];

    pub fn name_ru(&self) -> &'static str {
        match self {
            MuscleGroup::Shoulders => "Плечи",
            MuscleGroup::Chest => "Грудь",
            MuscleGroup::Back => "Спина",
            MuscleGroup::Core => "Пресс",
            MuscleGroup::Legs => "Ноги",
            MuscleGroup::Arms => "Руки",
            MuscleGroup::FullBody => "Всё тело",
        }
    }

    /// Canonical key as stored in the cache and in exercise files
    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Core => "core",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Arms => "arms",
            MuscleGroup::FullBody => "fullBody",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &Self::ALL
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Parse a muscle group name written by hand in an exercise file
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "shoulders" | "плечи" | "дельты" | "delts" => Some(MuscleGroup::Shoulders),
            "chest" | "грудь" | "грудные" | "pecs" => Some(MuscleGroup::Chest),
            "back" | "спина" | "lats" | "широчайшие" => Some(MuscleGroup::Back),
            "core" | "кор" | "пресс" | "abs" => Some(MuscleGroup::Core),
            "legs" | "ноги" | "glutes" | "ягодицы" | "quads" | "hamstrings" => Some(MuscleGroup::Legs),
            "arms" | "руки" | "biceps" | "triceps" | "бицепс" | "трицепс" | "forearms" => {
                Some(MuscleGroup::Arms)
            }
            "fullbody" | "full body" | "всё тело" | "все тело" => Some(MuscleGroup::FullBody),
            _ => None,
        }
    }
}

/// Fixed-size table with one slot per muscle group
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MuscleMap<T>([T; MuscleGroup::COUNT]);

impl<T> MuscleMap<T> {
    pub fn from_fn(mut f: impl FnMut(MuscleGroup) -> T) -> Self {
        Self(std::array::from_fn(|i| f(MuscleGroup::ALL[i])))
    }

    pub fn iter(&self) -> impl Iterator<Item = (MuscleGroup, &T)> {
        MuscleGroup::ALL.iter().copied().zip(self.0.iter())
    }
}

impl<T> Index<MuscleGroup> for MuscleMap<T> {
    type Output = T;

    fn index(&self, group: MuscleGroup) -> &T {
        &self.0[group.index()]
    }
}

impl<T> IndexMut<MuscleGroup> for MuscleMap<T> {
    fn index_mut(&mut self, group: MuscleGroup) -> &mut T {
        &mut self.0[group.index()]
    }
}

impl<T: Serialize> Serialize for MuscleMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MuscleGroup::COUNT))?;
        for (group, value) in self.iter() {
            map.serialize_entry(group.as_str(), value)?;
        }
        map.end()
    }
}

/// Workout scheme (протокол) types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SchemeType {
    Ladder,        // Лесенка
    Emom,          // Every minute on the minute
    Tabata,        // Табата
    Amrap,         // As many rounds as possible
    RoundsForTime, // RFT
    Circuit,       // Круговая
    Custom,        // Своя схема
}

impl SchemeType {
    pub fn label(&self) -> &'static str {
        match self {
            SchemeType::Ladder => "Лесенка",
            SchemeType::Emom => "EMOM",
            SchemeType::Tabata => "Табата",
            SchemeType::Amrap => "AMRAP",
            SchemeType::RoundsForTime => "RFT",
            SchemeType::Circuit => "Круговая",
            SchemeType::Custom => "Custom",
        }
    }

    /// Types where the listed reps are done again in every round
    pub fn repeats_every_round(&self) -> bool {
        matches!(
            self,
            SchemeType::Emom | SchemeType::Circuit | SchemeType::Tabata | SchemeType::Amrap
        )
    }
}

/// Keys recognised inside the scheme section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKey {
    Type,
    Rounds,
    Equipment,
    Pattern,
    TimePerRep,
    Rest,
}

/// Surface forms naming one scheme type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemeForms {
    pub kind: SchemeType,
    pub forms: Vec<String>,
}

/// Data tables driving section lookup and line classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Vocabulary {
    pub scheme_headings: Vec<String>,
    pub exercise_headings: Vec<String>,
    pub notes_headings: Vec<String>,
    /// First entry is the heading written by the analysis writer
    pub analysis_headings: Vec<String>,

    pub type_keys: Vec<String>,
    pub rounds_keys: Vec<String>,
    pub equipment_keys: Vec<String>,
    pub pattern_keys: Vec<String>,
    pub time_per_rep_keys: Vec<String>,
    pub rest_keys: Vec<String>,

    /// Checked in order, first containing form wins
    pub scheme_types: Vec<SchemeForms>,

    /// Lines whose name starts a word with one of these are not exercises
    pub noise_keywords: Vec<String>,
}

fn owned(forms: &[&str]) -> Vec<String> {
    forms.iter().map(|s| s.to_string()).collect()
}

fn forms(kind: SchemeType, list: &[&str]) -> SchemeForms {
    SchemeForms { kind, forms: owned(list) }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            scheme_headings: owned(&["Схема", "Схема тренировки", "Scheme", "Workout scheme"]),
            exercise_headings: owned(&["Упражнения", "Exercises"]),
            notes_headings: owned(&["Заметки", "Примечания", "Notes"]),
            analysis_headings: owned(&["AI Analysis", "AI Анализ", "Анализ", "Analysis"]),

            type_keys: owned(&["тип", "type", "протокол"]),
            rounds_keys: owned(&[
                "круги", "кругов", "раунды", "раундов", "подходы", "подходов", "лесенок",
                "rounds", "sets", "ladders",
            ]),
            equipment_keys: owned(&["снаряд", "вес", "equipment", "weight"]),
            pattern_keys: owned(&["паттерн", "повторения", "pattern", "reps"]),
            time_per_rep_keys: owned(&["время на повтор", "time per rep"]),
            rest_keys: owned(&["отдых", "rest"]),

            scheme_types: vec![
                forms(SchemeType::Ladder, &["лесенка", "лесенки", "ladder"]),
                forms(SchemeType::Emom, &["emom"]),
                forms(SchemeType::Tabata, &["табата", "tabata"]),
                forms(SchemeType::Amrap, &["amrap"]),
                forms(SchemeType::RoundsForTime, &["rft", "rounds for time", "на время"]),
                forms(SchemeType::Circuit, &["круговая", "circuit"]),
                forms(SchemeType::Custom, &["custom", "своя"]),
            ],

            noise_keywords: owned(&[
                "разминка", "заминка", "растяжка", "кошка", "воробей", "отдых", "повторить",
                "схема", "время", "раунд", "комплекс", "warm-up", "warmup", "cool-down",
                "cooldown", "stretching", "rest", "repeat", "scheme", "round", "complex",
            ]),
        }
    }
}

static STANDARD: LazyLock<Vocabulary> = LazyLock::new(Vocabulary::default);

/// Built-in Russian/English vocabulary
pub fn standard() -> &'static Vocabulary {
    &STANDARD
}

fn equals_any(list: &[String], text: &str) -> bool {
    let text = text.trim();
    list.iter().any(|form| form.trim().to_lowercase() == text.to_lowercase())
}

/// True when `keyword` occurs in `text` at the start of a word
///
/// Latin keywords must also end the word ("rest" never matches
/// "Restricted"); Cyrillic ones match as stems so that inflected forms
/// ("разминки") still count.
fn matches_keyword(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let whole_word = keyword.is_ascii();
    text.match_indices(keyword).any(|(idx, _)| {
        let starts = text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let ends = !whole_word
            || text[idx + keyword.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
        starts && ends
    })
}

impl Vocabulary {
    pub fn is_scheme_heading(&self, text: &str) -> bool {
        equals_any(&self.scheme_headings, text)
    }

    pub fn is_exercise_heading(&self, text: &str) -> bool {
        equals_any(&self.exercise_headings, text)
    }

    pub fn is_notes_heading(&self, text: &str) -> bool {
        equals_any(&self.notes_headings, text)
    }

    pub fn is_analysis_heading(&self, text: &str) -> bool {
        equals_any(&self.analysis_headings, text)
    }

    /// Heading text used when writing a fresh analysis section
    pub fn analysis_heading(&self) -> &str {
        self.analysis_headings
            .first()
            .map(String::as_str)
            .unwrap_or("AI Analysis")
    }

    /// Map a `key:` from the scheme section to its canonical meaning
    pub fn scheme_key(&self, key: &str) -> Option<SchemeKey> {
        let tables = [
            (&self.type_keys, SchemeKey::Type),
            (&self.rounds_keys, SchemeKey::Rounds),
            (&self.equipment_keys, SchemeKey::Equipment),
            (&self.pattern_keys, SchemeKey::Pattern),
            (&self.time_per_rep_keys, SchemeKey::TimePerRep),
            (&self.rest_keys, SchemeKey::Rest),
        ];
        tables
            .into_iter()
            .find(|(list, _)| equals_any(list, key))
            .map(|(_, meaning)| meaning)
    }

    /// Recognise a scheme type mentioned anywhere in `text`
    pub fn scheme_type(&self, text: &str) -> Option<SchemeType> {
        let lower = text.to_lowercase();
        self.scheme_types
            .iter()
            .find(|entry| {
                entry
                    .forms
                    .iter()
                    .any(|form| !form.is_empty() && lower.contains(&form.to_lowercase()))
            })
            .map(|entry| entry.kind)
    }

    pub fn is_noise(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.noise_keywords
            .iter()
            .any(|kw| matches_keyword(&lower, &kw.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_order_is_fixed() {
        assert_eq!(MuscleGroup::all().len(), MuscleGroup::COUNT);
        assert_eq!(MuscleGroup::ALL[0], MuscleGroup::Shoulders);
        assert_eq!(MuscleGroup::ALL[6], MuscleGroup::FullBody);
    }

    #[test]
    fn test_muscle_group_parse_ru_en() {
        assert_eq!(MuscleGroup::parse("Плечи"), Some(MuscleGroup::Shoulders));
        assert_eq!(MuscleGroup::parse("fullBody"), Some(MuscleGroup::FullBody));
        assert_eq!(MuscleGroup::parse("full_body"), Some(MuscleGroup::FullBody));
        assert_eq!(MuscleGroup::parse("ноги"), Some(MuscleGroup::Legs));
        assert_eq!(MuscleGroup::parse("neck"), None);
    }

    #[test]
    fn test_muscle_group_serde_names() {
        let json = serde_json::to_string(&MuscleGroup::FullBody).unwrap();
        assert_eq!(json, "\"fullBody\"");
        let parsed: MuscleGroup = serde_json::from_str("\"shoulders\"").unwrap();
        assert_eq!(parsed, MuscleGroup::Shoulders);
    }

    #[test]
    fn test_muscle_map_index_and_serialize() {
        let mut map: MuscleMap<u32> = MuscleMap::default();
        map[MuscleGroup::Legs] += 2;
        map[MuscleGroup::Core] += 1;
        assert_eq!(map[MuscleGroup::Legs], 2);
        assert_eq!(map.iter().map(|(_, v)| *v).sum::<u32>(), 3);

        let json = serde_json::to_value(map).unwrap();
        assert_eq!(json["legs"], 2);
        assert_eq!(json["fullBody"], 0);
    }

    #[test]
    fn test_repeats_every_round() {
        assert!(SchemeType::Emom.repeats_every_round());
        assert!(SchemeType::Tabata.repeats_every_round());
        assert!(SchemeType::Amrap.repeats_every_round());
        assert!(SchemeType::Circuit.repeats_every_round());
        assert!(!SchemeType::Ladder.repeats_every_round());
        assert!(!SchemeType::RoundsForTime.repeats_every_round());
        assert!(!SchemeType::Custom.repeats_every_round());
    }

    #[test]
    fn test_scheme_type_detection() {
        let vocab = standard();
        assert_eq!(vocab.scheme_type("Лесенка"), Some(SchemeType::Ladder));
        assert_eq!(vocab.scheme_type("EMOM 20 минут"), Some(SchemeType::Emom));
        assert_eq!(vocab.scheme_type("табата"), Some(SchemeType::Tabata));
        assert_eq!(vocab.scheme_type("Гиревой спорт"), None);
    }

    #[test]
    fn test_scheme_key_case_insensitive() {
        let vocab = standard();
        assert_eq!(vocab.scheme_key("Тип"), Some(SchemeKey::Type));
        assert_eq!(vocab.scheme_key(" КРУГОВ "), Some(SchemeKey::Rounds));
        assert_eq!(vocab.scheme_key("Pattern"), Some(SchemeKey::Pattern));
        assert_eq!(vocab.scheme_key("Снаряд"), Some(SchemeKey::Equipment));
        assert_eq!(vocab.scheme_key("Дата"), None);
    }

    #[test]
    fn test_noise_matches_word_starts_only() {
        let vocab = standard();
        assert!(vocab.is_noise("Разминка"));
        assert!(vocab.is_noise("суставная разминка"));
        assert!(vocab.is_noise("Отдых 1 мин"));
        assert!(vocab.is_noise("Warm-up"));
        // "around" must not trip the "round" keyword
        assert!(!vocab.is_noise("Around the world"));
        assert!(!vocab.is_noise("Махи гирей"));
    }

    #[test]
    fn test_latin_noise_matches_whole_words() {
        let vocab = standard();
        assert!(vocab.is_noise("Rest 60 sec"));
        assert!(vocab.is_noise("Repeat x3"));
        assert!(vocab.is_noise("Разминки"));
        assert!(!vocab.is_noise("Restricted range swings"));
        assert!(!vocab.is_noise("Time under tension squats"));
        assert!(!vocab.is_noise("Roundhouse press"));
    }

    #[test]
    fn test_headings() {
        let vocab = standard();
        assert!(vocab.is_scheme_heading("схема"));
        assert!(vocab.is_exercise_heading("Упражнения"));
        assert!(vocab.is_analysis_heading("AI Analysis"));
        assert!(!vocab.is_exercise_heading("Упражнения дня"));
        assert_eq!(vocab.analysis_heading(), "AI Analysis");
    }

    #[test]
    fn test_vocabulary_partial_override_keeps_defaults() {
        let vocab: Vocabulary =
            serde_yaml::from_str("noise_keywords: [\"планка\"]").unwrap();
        assert!(vocab.is_noise("Планка"));
        assert!(!vocab.is_noise("Разминка"));
        assert!(vocab.is_scheme_heading("Scheme"));
    }
}
