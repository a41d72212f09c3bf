//! Emotion detection and per-emotion prosody tuning (spec §4.5).

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Anger,
    Joy,
    Sadness,
    Fear,
    Calm,
    Suspense,
}

/// Ordered so that tie-breaking picks the first emotion in this list, as in
/// the original source's dictionary iteration order.
const EMOTION_ORDER: &[Emotion] = &[
    Emotion::Anger,
    Emotion::Joy,
    Emotion::Sadness,
    Emotion::Fear,
    Emotion::Calm,
    Emotion::Suspense,
];

static RE_ANGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(schrie|brüllte|knurrte|wut|zorn|fauchte|wütend|tobte|stampfte|donnerte)\b")
        .unwrap()
});
static RE_JOY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(lachte|jubelte|grinste|freute|strahlte|fröhlich|kicherte|jauchzte|hüpfte)\b")
        .unwrap()
});
static RE_SADNESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(weinte|schluchzte|traurig|seufzte|leise|verzweifelt|träne|jammerte|klagte)\b")
        .unwrap()
});
static RE_FEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(zitterte|aengstlich|ängstlich|panik|furcht|flucht|erschrocken|bebte|schauderte)\b")
        .unwrap()
});
static RE_CALM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(fluesterte|flüsterte|ruhig|sanft|behutsam|gelassen|still|friedlich|sachte)\b")
        .unwrap()
});
static RE_SUSPENSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(plötzlich|dunkel|schatten|geheimnis|lauerte|schlich|unheimlich|geisterhaft)\b")
        .unwrap()
});

fn lexical_regex(emotion: Emotion) -> &'static Regex {
    match emotion {
        Emotion::Anger => &RE_ANGER,
        Emotion::Joy => &RE_JOY,
        Emotion::Sadness => &RE_SADNESS,
        Emotion::Fear => &RE_FEAR,
        Emotion::Calm => &RE_CALM,
        Emotion::Suspense => &RE_SUSPENSE,
    }
}

fn add_score(scores: &mut [(Emotion, i32)], emotion: Emotion, delta: i32) {
    if let Some(entry) = scores.iter_mut().find(|(e, _)| *e == emotion) {
        entry.1 += delta;
    }
}

/// Scores each emotion from punctuation density and German lexical cues,
/// returning the top scorer if nonzero.
pub fn detect_emotion(text: &str) -> Option<Emotion> {
    let mut scores: Vec<(Emotion, i32)> = EMOTION_ORDER.iter().map(|e| (*e, 0)).collect();

    let exclaim_count = text.matches('!').count();
    if exclaim_count >= 2 {
        add_score(&mut scores, Emotion::Anger, 2);
        add_score(&mut scores, Emotion::Joy, 1);
    } else if exclaim_count == 1 {
        add_score(&mut scores, Emotion::Joy, 1);
        add_score(&mut scores, Emotion::Anger, 1);
    }

    let question_count = text.matches('?').count();
    if question_count >= 2 {
        add_score(&mut scores, Emotion::Fear, 1);
        add_score(&mut scores, Emotion::Suspense, 1);
    } else if question_count == 1 {
        add_score(&mut scores, Emotion::Suspense, 1);
    }

    if text.contains("...") || text.contains('…') {
        add_score(&mut scores, Emotion::Suspense, 2);
        add_score(&mut scores, Emotion::Calm, 1);
    }

    for emotion in EMOTION_ORDER {
        if lexical_regex(*emotion).is_match(text) {
            add_score(&mut scores, *emotion, 3);
        }
    }

    let (best_emotion, best_score) = scores
        .iter()
        .copied()
        .max_by_key(|(e, score)| (*score, std::cmp::Reverse(e.rank())))
        .unwrap();
    if best_score > 0 {
        Some(best_emotion)
    } else {
        None
    }
}

impl Emotion {
    fn rank(&self) -> usize {
        EMOTION_ORDER.iter().position(|e| e == self).unwrap()
    }
}

/// (length_multiplier, noise_delta, noise_w_delta) per emotion.
pub fn tuning(emotion: Emotion) -> (f32, f32, f32) {
    match emotion {
        Emotion::Anger => (0.97, 0.10, 0.07),
        Emotion::Joy => (0.99, 0.08, 0.06),
        Emotion::Sadness => (1.10, -0.08, -0.06),
        Emotion::Fear => (1.01, 0.08, 0.06),
        Emotion::Calm => (1.06, -0.06, -0.05),
        Emotion::Suspense => (1.08, -0.05, -0.04),
    }
}

/// Fixed emotion-to-speaker-index map for the multi-speaker emotional
/// model. Treated as arbitrary configuration, not semantic truth (spec §9).
pub fn speaker_index(emotion: Emotion) -> u32 {
    match emotion {
        Emotion::Anger => 1,
        Emotion::Joy => 0,
        Emotion::Sadness => 5,
        Emotion::Fear => 6,
        Emotion::Calm => 4,
        Emotion::Suspense => 7,
    }
}
