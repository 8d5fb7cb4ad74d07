//! Keyword emotion classifier and the per-emotion visual identity tables.

use std::fmt;

use crate::types::Rgba;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emotion {
    Joy,
    Peace,
    Melancholy,
    Anxiety,
    Anger,
    Love,
    Confusion,
}

/// Petal outline family consumed by the flower renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeFamily {
    Radiance,
    Lotus,
    Willow,
    Aster,
    Flame,
    Heart,
    Fragment,
}

impl Emotion {
    pub const DEFAULT: Emotion = Emotion::Peace;

    pub const ALL: [Emotion; 7] = [
        Emotion::Joy,
        Emotion::Peace,
        Emotion::Melancholy,
        Emotion::Anxiety,
        Emotion::Anger,
        Emotion::Love,
        Emotion::Confusion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Peace => "peace",
            Emotion::Melancholy => "melancholy",
            Emotion::Anxiety => "anxiety",
            Emotion::Anger => "anger",
            Emotion::Love => "love",
            Emotion::Confusion => "confusion",
        }
    }

    pub fn from_label(label: &str) -> Option<Emotion> {
        Emotion::ALL
            .into_iter()
            .find(|emotion| emotion.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Reads a stored label, mapping anything unrecognized (including values
    /// written by a newer schema) to the default emotion.
    pub fn from_stored(label: Option<&str>) -> Emotion {
        label.and_then(Emotion::from_label).unwrap_or(Emotion::DEFAULT)
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Emotion::Joy => &[
                "happy", "joy", "excited", "wonderful", "amazing", "great", "fantastic",
                "awesome", "delighted", "thrilled", "celebrate", "laugh", "smile", "fun",
                "blessed",
            ],
            Emotion::Peace => &[
                "calm", "peaceful", "serene", "quiet", "still", "tranquil", "relaxed",
                "content", "zen", "mindful", "gentle", "soft", "rest", "breathe", "meditate",
            ],
            Emotion::Melancholy => &[
                "sad", "blue", "melancholy", "lonely", "miss", "remember", "nostalgia",
                "wistful", "sorrow", "grief", "loss", "empty", "cry", "tears", "ache",
            ],
            Emotion::Anxiety => &[
                "worried", "anxious", "nervous", "scared", "afraid", "fear", "panic", "stress",
                "overwhelmed", "uncertain", "dread", "uneasy", "restless", "tense", "doubt",
            ],
            Emotion::Anger => &[
                "angry", "furious", "rage", "frustrated", "annoyed", "irritated", "mad", "hate",
                "resentment", "bitter", "hostile", "outraged", "livid", "upset", "disgusted",
            ],
            Emotion::Love => &[
                "love", "adore", "cherish", "heart", "affection", "care", "tender", "warm",
                "embrace", "kiss", "devotion", "passion", "soulmate", "beloved", "romance",
            ],
            Emotion::Confusion => &[
                "confused", "lost", "uncertain", "unsure", "puzzled", "bewildered",
                "perplexed", "torn", "conflicted", "questioning", "wonder", "mystery",
                "strange", "weird", "unclear",
            ],
        }
    }

    pub fn shape(self) -> ShapeFamily {
        match self {
            Emotion::Joy => ShapeFamily::Radiance,
            Emotion::Peace => ShapeFamily::Lotus,
            Emotion::Melancholy => ShapeFamily::Willow,
            Emotion::Anxiety => ShapeFamily::Aster,
            Emotion::Anger => ShapeFamily::Flame,
            Emotion::Love => ShapeFamily::Heart,
            Emotion::Confusion => ShapeFamily::Fragment,
        }
    }

    /// Normalized attractor point in the garden's unit square.
    pub fn center(self) -> (f32, f32) {
        match self {
            Emotion::Joy => (0.7, 0.2),
            Emotion::Peace => (0.5, 0.5),
            Emotion::Melancholy => (0.2, 0.7),
            Emotion::Anxiety => (0.8, 0.6),
            Emotion::Anger => (0.3, 0.3),
            Emotion::Love => (0.6, 0.4),
            Emotion::Confusion => (0.4, 0.8),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scores every emotion by keyword presence. A keyword counts once no matter
/// how often it appears.
pub fn scores(text: &str) -> [(Emotion, usize); 7] {
    let lower = text.to_lowercase();
    Emotion::ALL.map(|emotion| {
        let hits = emotion
            .keywords()
            .iter()
            .filter(|keyword| lower.contains(*keyword))
            .count();
        (emotion, hits)
    })
}

/// A unique top score wins; a shared top score or no match at all yields
/// [`Emotion::DEFAULT`].
pub fn classify(text: &str) -> Emotion {
    let scores = scores(text);
    let best = scores.iter().map(|(_, score)| *score).max().unwrap_or(0);
    if best == 0 {
        return Emotion::DEFAULT;
    }
    let mut leaders = scores.iter().filter(|(_, score)| *score == best);
    match (leaders.next(), leaders.next()) {
        (Some((emotion, _)), None) => *emotion,
        _ => Emotion::DEFAULT,
    }
}

/// Emotion → color lookup. Missing entries resolve to `fallback`.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    entries: Vec<(Emotion, Rgba)>,
    fallback: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: vec![
                (Emotion::Joy, Rgba::rgb8(0xE8, 0xA4, 0xC4)),
                (Emotion::Peace, Rgba::rgb8(0xA4, 0xD4, 0xC4)),
                (Emotion::Melancholy, Rgba::rgb8(0xC4, 0xB0, 0xE8)),
                (Emotion::Anxiety, Rgba::rgb8(0xF0, 0xC8, 0x98)),
                (Emotion::Anger, Rgba::rgb8(0xE8, 0x94, 0x94)),
                (Emotion::Love, Rgba::rgb8(0xF0, 0xC4, 0xD8)),
                (Emotion::Confusion, Rgba::rgb8(0xD4, 0xC4, 0xE8)),
            ],
            fallback: Rgba::rgb8(0xA4, 0xD4, 0xC4),
        }
    }
}

impl Palette {
    pub fn new(entries: Vec<(Emotion, Rgba)>, fallback: Rgba) -> Self {
        Self { entries, fallback }
    }

    pub fn color(&self, emotion: Emotion) -> Rgba {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == emotion)
            .map(|(_, color)| *color)
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod classify_fn {
        use super::*;

        #[test]
        fn empty_text_is_default() {
            assert_eq!(classify(""), Emotion::DEFAULT);
            assert_eq!(classify("   \n"), Emotion::DEFAULT);
        }

        #[test]
        fn case_insensitive() {
            assert_eq!(classify("I feel JOY"), classify("i feel joy"));
            assert_eq!(classify("I feel JOY"), Emotion::Joy);
        }

        #[test]
        fn anger_keywords_dominate() {
            assert_eq!(classify("I am furious and enraged"), Emotion::Anger);
        }

        #[test]
        fn detects_anxiety() {
            assert_eq!(classify("I am so anxious about tomorrow"), Emotion::Anxiety);
        }

        #[test]
        fn repeated_keyword_counts_once() {
            // "sad sad sad" is one melancholy hit; "happy" + "smile" are two joy hits.
            assert_eq!(classify("sad sad sad, happy smile"), Emotion::Joy);
        }

        #[test]
        fn tie_resolves_to_default() {
            assert_eq!(classify("happy but angry"), Emotion::DEFAULT);
        }

        #[test]
        fn shared_keyword_feeds_both_emotions() {
            // "uncertain" belongs to anxiety and confusion; "puzzled" breaks the tie.
            assert_eq!(classify("uncertain and puzzled"), Emotion::Confusion);
        }

        #[test]
        fn no_match_is_default() {
            assert_eq!(classify("the train departs at nine"), Emotion::DEFAULT);
        }

        #[test]
        fn always_returns_known_label() {
            for text in ["", "love love", "calm", "weird lonely", "ÄÖÜ ß 漢字"] {
                assert!(Emotion::ALL.contains(&classify(text)));
            }
        }
    }

    mod scores_fn {
        use super::*;

        #[test]
        fn counts_distinct_keywords() {
            let scores = scores("furious rage rage hate");
            let anger = scores.iter().find(|(e, _)| *e == Emotion::Anger).unwrap();
            assert_eq!(anger.1, 3);
        }
    }

    mod labels {
        use super::*;

        #[test]
        fn round_trip_every_label() {
            for emotion in Emotion::ALL {
                assert_eq!(Emotion::from_label(emotion.label()), Some(emotion));
            }
        }

        #[test]
        fn unknown_stored_value_falls_back() {
            assert_eq!(Emotion::from_stored(Some("euphoria")), Emotion::DEFAULT);
            assert_eq!(Emotion::from_stored(None), Emotion::DEFAULT);
            assert_eq!(Emotion::from_stored(Some("Love")), Emotion::Love);
        }

        #[test]
        fn every_emotion_has_a_distinct_shape() {
            let shapes: std::collections::HashSet<ShapeFamily> =
                Emotion::ALL.iter().map(|e| e.shape()).collect();
            assert_eq!(shapes.len(), Emotion::ALL.len());
        }
    }

    mod palette {
        use super::*;

        #[test]
        fn default_palette_matches_table() {
            let palette = Palette::default();
            assert_eq!(palette.color(Emotion::Joy).to_rgb8(), (0xE8, 0xA4, 0xC4));
            assert_eq!(palette.color(Emotion::Confusion).to_rgb8(), (0xD4, 0xC4, 0xE8));
        }

        #[test]
        fn missing_entry_uses_fallback() {
            let palette = Palette::new(vec![(Emotion::Joy, Rgba::WHITE)], Rgba::rgb8(1, 2, 3));
            assert_eq!(palette.color(Emotion::Joy), Rgba::WHITE);
            assert_eq!(palette.color(Emotion::Anger), Rgba::rgb8(1, 2, 3));
        }
    }
}
