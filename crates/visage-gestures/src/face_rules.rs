//! Facial expression rules over the 468/478 point face mesh.
//!
//! All measures are in normalized image coordinates, so thresholds are
//! implicitly tied to how large the face appears in frame. Rules reading the
//! refined iris points (468+) only match on refined meshes; on a plain mesh
//! they are skipped as malformed geometry.

use visage_core::landmarks::face::*;
use visage_core::SubjectKind;

use crate::rule::*;

/// Tuned thresholds, one constant per rule, in the order the rule reads them
pub mod thresholds {
    pub const RAISED_LEFT_EYEBROW: f64 = 0.06;
    pub const RAISED_RIGHT_EYEBROW: f64 = 0.06;
    pub const RAISED_EYEBROW: f64 = 0.06;
    pub const MOUTH_OPEN: f64 = 0.05;
    pub const FROWN: f64 = 0.035;
    pub const PURSED_LIPS: f64 = 0.025;
    pub const SMIRK_LEFT: f64 = 0.015;
    pub const SMIRK_RIGHT: f64 = 0.015;
    pub const CHEEK_PUFF: f64 = 0.25;
    pub const NOSTRIL_FLARE: f64 = 0.05;
    pub const LIP_BITE: [f64; 2] = [0.008, 0.01];
    pub const BROW_FURROW: f64 = 0.03;
    pub const BROW_LIFT: f64 = -0.03;
    pub const EYE_ROLL_UP: f64 = -0.02;
    pub const EYE_ROLL_DOWN: f64 = 0.02;
    pub const CHIN_THRUST_FORWARD: f64 = -0.1;
    pub const CHIN_TUCK: f64 = 0.1;
    pub const EYE_BLINK_LEFT: f64 = 0.005;
    pub const EYE_BLINK_RIGHT: f64 = 0.005;
    pub const EYES_WIDE_OPEN: f64 = 0.035;
    pub const GLARE_LEFT: f64 = 0.02;
    pub const GLARE_RIGHT: f64 = 0.02;
    pub const GLARE_UP: f64 = -0.02;
    pub const GLARE_DOWN: f64 = 0.02;
    pub const BROWS_RAISED_AND_MOUTH_OPEN: [f64; 2] = [0.03, 0.04];
    pub const BROWS_LOWERED_AND_LIPS_PRESSED: [f64; 2] = [0.01, 0.01];
    pub const EYE_SQUINT_LEFT: f64 = 0.007;
    pub const EYE_SQUINT_RIGHT: f64 = 0.007;
    pub const JAW_DROP: f64 = 0.15;
    pub const HEAD_TILT_LEFT: f64 = 0.03;
    pub const HEAD_TILT_RIGHT: f64 = 0.03;
    pub const HEAD_TURN_RIGHT: f64 = -0.05;
    pub const HEAD_TURN_DOWN: f64 = 0.08;
    pub const NOSE_WRINKLE: f64 = 0.02;
    pub const BROW_RAISE_AND_SMILE: [f64; 2] = [0.1, 0.08];
    pub const BROW_FURROW_AND_FROWN: [f64; 2] = [0.03, 0.035];
    pub const MOUTH_OPEN_AND_HEAD_TILT: [f64; 2] = [0.04, 0.03];
    pub const SUBTLE_SMILE: [f64; 2] = [0.04, 0.06];
    pub const WIDE_SMILE: f64 = 0.08;
    pub const HALF_SMILE_LEFT: f64 = 0.02;
    pub const HALF_SMILE_RIGHT: f64 = 0.02;
    pub const LIP_COMPRESSION: f64 = 0.003;
    pub const LIP_PROTRUSION: f64 = -0.02;
    pub const MOUTH_CORNER_DOWN_LEFT: f64 = 0.01;
    pub const MOUTH_CORNER_DOWN_RIGHT: f64 = 0.01;
    pub const MOUTH_CORNER_UP_LEFT: f64 = -0.01;
    pub const MOUTH_CORNER_UP_RIGHT: f64 = -0.01;
    pub const UPPER_LIP_RAISE: f64 = -0.01;
    pub const LOWER_LIP_DEPRESS: f64 = 0.01;
    pub const CHEEK_RAISE_LEFT: f64 = -0.01;
    pub const CHEEK_RAISE_RIGHT: f64 = -0.01;
    pub const EYE_NARROW_LEFT: f64 = 0.01;
    pub const EYE_NARROW_RIGHT: f64 = 0.01;
    pub const EYE_WIDEN_LEFT: f64 = 0.025;
    pub const EYE_WIDEN_RIGHT: f64 = 0.025;
    pub const EYEBROW_FLASH: f64 = 0.08;
    pub const FOREHEAD_FURROW: f64 = 0.08;
    pub const TEMPLE_TENSION: f64 = 0.15;
    pub const JAW_CLENCH: f64 = 0.02;
    pub const MOUTH_TWIST_LEFT: f64 = -0.03;
    pub const MOUTH_TWIST_RIGHT: f64 = -0.03;
    pub const NOSTRIL_COMPRESS: f64 = 0.03;
    pub const NOSTRIL_DILATE: f64 = 0.06;
    pub const CHIN_DIMPLE: f64 = 0.01;
    pub const CHIN_RAISE: f64 = -0.01;
    pub const HEAD_SHAKE: f64 = 0.1;
    pub const HEAD_NOD: f64 = 0.12;
    pub const EAR_WIGGLE_LEFT: f64 = 0.05;
    pub const EAR_WIGGLE_RIGHT: f64 = 0.05;
    pub const EYE_FLUTTER_LEFT: f64 = 0.003;
    pub const EYE_FLUTTER_RIGHT: f64 = 0.003;
    pub const MICRO_SMILE: [f64; 2] = [0.025, 0.035];
    pub const MICRO_FROWN: f64 = 0.02;
    pub const EYEBROW_TWITCH_LEFT: [f64; 2] = [0.04, 0.05];
    pub const EYEBROW_TWITCH_RIGHT: [f64; 2] = [0.04, 0.05];
    pub const LIP_TWITCH_LEFT: f64 = -0.005;
    pub const LIP_TWITCH_RIGHT: f64 = -0.005;
    pub const EYE_CONTACT_DIRECT: f64 = 0.01;
    pub const EYE_CONTACT_AVOIDANCE: f64 = 0.03;
    pub const PUPIL_DILATION: f64 = 0.02;
    pub const PUPIL_CONSTRICTION: f64 = 0.005;
    pub const SURPRISE_FULL: [f64; 2] = [0.07, 0.06];
    pub const DISGUST_EXPRESSION: [f64; 2] = [-0.02, 0.015];
    pub const FEAR_EXPRESSION: [f64; 2] = [0.03, 0.05];
    pub const ANGER_EXPRESSION: [f64; 2] = [0.025, 0.03];
    pub const SADNESS_EXPRESSION: [f64; 2] = [0.015, 0.015];
    pub const CONTEMPT_LEFT: f64 = -0.02;
    pub const CONTEMPT_RIGHT: f64 = -0.02;
    pub const STRESS_INDICATORS: [f64; 2] = [0.025, 0.015];
    pub const RELAXED_EXPRESSION: [f64; 2] = [0.015, 0.01];
    pub const CONCENTRATION: [f64; 2] = [0.035, 0.012];
    pub const CONFUSION: [f64; 2] = [0.03, 0.02];
    pub const SKEPTICISM: [f64; 2] = [0.04, 0.025];
    pub const AMUSEMENT: [f64; 2] = [0.06, 0.015];
    pub const BOREDOM: [f64; 2] = [0.008, 0.005];
    pub const EXCITEMENT: [f64; 2] = [0.025, 0.07];
    pub const DETERMINATION: [f64; 2] = [0.03, 0.02];
    pub const NERVOUSNESS: [f64; 2] = [0.006, 0.01];
    pub const CONFIDENCE: [f64; 2] = [-0.05, 0.05];
    pub const INSECURITY: [f64; 2] = [0.05, 0.025];
    pub const THOUGHTFULNESS: [f64; 2] = [0.04, 0.02];
    pub const DISBELIEF: [f64; 2] = [0.05, 0.03];
    pub const EMPATHY: [f64; 2] = [0.04, 0.02];
    pub const CURIOSITY: [f64; 2] = [0.045, -0.06];
    pub const ANTICIPATION: [f64; 2] = [0.02, 0.02];
    pub const RELIEF: [f64; 2] = [0.05, 0.015];
    pub const FRUSTRATION: [f64; 2] = [0.025, 0.006];
    pub const AFFECTION: [f64; 2] = [0.06, 0.018];
    pub const PRIDE: [f64; 2] = [-0.08, 0.055];
    pub const EMBARRASSMENT: [f64; 2] = [0.05, 0.01];
    pub const GUILT: [f64; 2] = [0.06, 0.02];
    pub const JEALOUSY: [f64; 2] = [0.02, 0.02];
    pub const ENVY: [f64; 2] = [0.008, 0.03];
    pub const LONGING: [f64; 2] = [0.02, 0.015];
    pub const NOSTALGIA: [f64; 2] = [0.04, 0.03];
    pub const MELANCHOLY: [f64; 2] = [0.02, 0.012];
    pub const SERENITY: [f64; 2] = [0.018, 0.008];
    pub const EUPHORIA: [f64; 2] = [0.09, 0.03];
    pub const DESPAIR: [f64; 2] = [0.025, 0.005];
    pub const HOPE: [f64; 2] = [0.045, 0.035];
    pub const RESIGNATION: [f64; 2] = [0.01, 0.008];
    pub const DEFIANCE: [f64; 2] = [-0.06, 0.025];
    pub const SUBMISSION: [f64; 2] = [0.04, 0.008];
    pub const DOMINANCE: [f64; 2] = [-0.07, 0.01];
    pub const VULNERABILITY: [f64; 2] = [0.025, 0.03];
    pub const STRENGTH: [f64; 2] = [0.015, -0.04];
    pub const WEAKNESS: [f64; 2] = [0.05, 0.03];
    pub const ALERTNESS: [f64; 2] = [0.022, 0.03];
    pub const DROWSINESS: [f64; 2] = [0.006, 0.02];
    pub const INTENSITY: [f64; 2] = [0.01, 0.02];
    pub const GENTLENESS: [f64; 2] = [0.04, 0.015];
}

use thresholds::*;

// Recurring measures

/// Eye top minus brow; grows as the brow lifts
fn left_brow_gap() -> Measure {
    diff(y(LEFT_EYE_TOP), y(LEFT_BROW))
}

fn right_brow_gap() -> Measure {
    diff(y(RIGHT_EYE_TOP), y(RIGHT_BROW))
}

fn lip_gap() -> Measure {
    abs_diff(y(UPPER_LIP_INNER), y(LOWER_LIP_INNER))
}

fn mouth_width() -> Measure {
    abs_diff(x(MOUTH_LEFT), x(MOUTH_RIGHT))
}

fn brow_spread() -> Measure {
    abs_diff(x(LEFT_BROW), x(RIGHT_BROW))
}

fn left_eye_opening() -> Measure {
    abs_diff(y(LEFT_EYE_TOP), y(LEFT_EYE_BOTTOM))
}

fn right_eye_opening() -> Measure {
    abs_diff(y(RIGHT_EYE_TOP), y(RIGHT_EYE_BOTTOM))
}

fn jaw_level() -> Measure {
    abs_diff(y(LEFT_JAW), y(RIGHT_JAW))
}

fn nose_crease() -> Measure {
    abs_diff(y(NOSE_BRIDGE), y(NOSE_ROOT))
}

fn nostril_width() -> Measure {
    abs_diff(x(NOSE_TIP_LEFT), x(NOSE_TIP_RIGHT))
}

fn face_edge_tilt() -> Measure {
    abs_diff(y(LEFT_FACE_EDGE), y(RIGHT_FACE_EDGE))
}

/// Forehead minus chin
fn head_drop() -> Measure {
    diff(y(FOREHEAD_TOP), y(CHIN))
}

fn chin_depth() -> Measure {
    z(CHIN)
}

/// Left corner minus right corner, vertically
fn corner_skew() -> Measure {
    diff(y(MOUTH_LEFT), y(MOUTH_RIGHT))
}

fn left_corner_drop() -> Measure {
    diff(y(MOUTH_LEFT), y(UPPER_LIP_INNER))
}

fn right_corner_drop() -> Measure {
    diff(y(MOUTH_RIGHT), y(UPPER_LIP_INNER))
}

fn upper_lip_lift() -> Measure {
    diff(y(UPPER_LIP_OUTER), y(LOWER_LIP_OUTER))
}

fn rule(name: &str, when: Condition) -> RuleSpec {
    RuleSpec::boolean(name, SubjectKind::Face, when)
}

fn both(name: &str, a: Condition, b: Condition) -> RuleSpec {
    rule(name, all([a, b]))
}

/// The facial half of the built-in catalog
pub fn face_rules() -> Vec<RuleSpec> {
    vec![
        rule("raised left eyebrow", gt(left_brow_gap(), RAISED_LEFT_EYEBROW)),
        rule("raised right eyebrow", gt(right_brow_gap(), RAISED_RIGHT_EYEBROW)),
        rule(
            "raised eyebrow",
            any([
                gt(left_brow_gap(), RAISED_EYEBROW),
                gt(right_brow_gap(), RAISED_EYEBROW),
            ]),
        ),
        rule("mouth open", gt(lip_gap(), MOUTH_OPEN)),
        rule("frown", lt(mouth_width(), FROWN)),
        rule("pursed lips", lt(mouth_width(), PURSED_LIPS)),
        rule("smirk left", gt(corner_skew(), SMIRK_LEFT)),
        rule(
            "smirk right",
            gt(diff(y(MOUTH_RIGHT), y(MOUTH_LEFT)), SMIRK_RIGHT),
        ),
        rule(
            "cheek puff",
            gt(abs_diff(x(LEFT_CHEEK), x(RIGHT_CHEEK)), CHEEK_PUFF),
        ),
        rule("nostril flare", gt(nostril_width(), NOSTRIL_FLARE)),
        both(
            "lip bite",
            lt(lip_gap(), LIP_BITE[0]),
            lt(mouth_width(), LIP_BITE[1]),
        ),
        rule("brow furrow", lt(brow_spread(), BROW_FURROW)),
        rule(
            "brow lift",
            lt(
                diff(mean([y(LEFT_BROW), y(RIGHT_BROW)]), y(FOREHEAD_TOP)),
                BROW_LIFT,
            ),
        ),
        rule(
            "eye roll up",
            lt(diff(y(LEFT_IRIS), y(RIGHT_IRIS_EDGE)), EYE_ROLL_UP),
        ),
        rule(
            "eye roll down",
            gt(diff(y(LEFT_IRIS), y(RIGHT_IRIS_EDGE)), EYE_ROLL_DOWN),
        ),
        rule("chin thrust forward", lt(chin_depth(), CHIN_THRUST_FORWARD)),
        rule("chin tuck", gt(chin_depth(), CHIN_TUCK)),
        rule("eye blink left", lt(left_eye_opening(), EYE_BLINK_LEFT)),
        rule("eye blink right", lt(right_eye_opening(), EYE_BLINK_RIGHT)),
        rule("eyes wide open", gt(left_eye_opening(), EYES_WIDE_OPEN)),
        rule(
            "glare left",
            gt(diff(x(LEFT_EYE_OUTER), x(LEFT_EYE_INNER)), GLARE_LEFT),
        ),
        rule(
            "glare right",
            gt(diff(x(RIGHT_EYE_OUTER), x(RIGHT_EYE_INNER)), GLARE_RIGHT),
        ),
        rule("glare up", lt(eyelid_line(), GLARE_UP)),
        rule("glare down", gt(eyelid_line(), GLARE_DOWN)),
        both(
            "brows raised and mouth open",
            gt(left_brow_gap(), BROWS_RAISED_AND_MOUTH_OPEN[0]),
            gt(lip_gap(), BROWS_RAISED_AND_MOUTH_OPEN[1]),
        ),
        both(
            "brows lowered and lips pressed",
            lt(left_brow_gap(), BROWS_LOWERED_AND_LIPS_PRESSED[0]),
            lt(lip_gap(), BROWS_LOWERED_AND_LIPS_PRESSED[1]),
        ),
        rule("eye squint left", lt(left_eye_opening(), EYE_SQUINT_LEFT)),
        rule("eye squint right", lt(right_eye_opening(), EYE_SQUINT_RIGHT)),
        rule(
            "jaw drop",
            gt(abs_diff(y(CHIN), y(UPPER_LIP_INNER)), JAW_DROP),
        ),
        rule(
            "head tilt left",
            gt(diff(y(LEFT_FACE_EDGE), y(RIGHT_FACE_EDGE)), HEAD_TILT_LEFT),
        ),
        rule(
            "head tilt right",
            gt(diff(y(RIGHT_FACE_EDGE), y(LEFT_FACE_EDGE)), HEAD_TILT_RIGHT),
        ),
        rule(
            "head turn right",
            lt(diff(x(RIGHT_FACE_EDGE), x(LEFT_FACE_EDGE)), HEAD_TURN_RIGHT),
        ),
        rule("head turn down", gt(head_drop(), HEAD_TURN_DOWN)),
        rule("nose wrinkle", lt(nose_crease(), NOSE_WRINKLE)),
        both(
            "brow raise + smile",
            gt(left_brow_gap(), BROW_RAISE_AND_SMILE[0]),
            gt(mouth_width(), BROW_RAISE_AND_SMILE[1]),
        ),
        both(
            "brow furrow + frown",
            lt(brow_spread(), BROW_FURROW_AND_FROWN[0]),
            lt(mouth_width(), BROW_FURROW_AND_FROWN[1]),
        ),
        both(
            "mouth open + head tilt",
            gt(lip_gap(), MOUTH_OPEN_AND_HEAD_TILT[0]),
            gt(face_edge_tilt(), MOUTH_OPEN_AND_HEAD_TILT[1]),
        ),
        rule(
            "subtle smile",
            between(mouth_width(), SUBTLE_SMILE[0], SUBTLE_SMILE[1]),
        ),
        rule("wide smile", gt(mouth_width(), WIDE_SMILE)),
        rule(
            "half smile left",
            gt(diff(x(MOUTH_LEFT), x(MOUTH_RIGHT)), HALF_SMILE_LEFT),
        ),
        rule(
            "half smile right",
            gt(diff(x(MOUTH_RIGHT), x(MOUTH_LEFT)), HALF_SMILE_RIGHT),
        ),
        rule("lip compression", lt(lip_gap(), LIP_COMPRESSION)),
        rule(
            "lip protrusion",
            lt(z(UPPER_LIP_INNER), LIP_PROTRUSION),
        ),
        rule(
            "mouth corner down left",
            gt(left_corner_drop(), MOUTH_CORNER_DOWN_LEFT),
        ),
        rule(
            "mouth corner down right",
            gt(right_corner_drop(), MOUTH_CORNER_DOWN_RIGHT),
        ),
        rule(
            "mouth corner up left",
            lt(left_corner_drop(), MOUTH_CORNER_UP_LEFT),
        ),
        rule(
            "mouth corner up right",
            lt(right_corner_drop(), MOUTH_CORNER_UP_RIGHT),
        ),
        rule("upper lip raise", lt(upper_lip_lift(), UPPER_LIP_RAISE)),
        rule(
            "lower lip depress",
            gt(
                diff(y(LOWER_LIP_OUTER), y(LOWER_LIP_BOTTOM)),
                LOWER_LIP_DEPRESS,
            ),
        ),
        rule(
            "cheek raise left",
            lt(
                diff(y(LEFT_CHEEKBONE_UPPER), y(LEFT_CHEEKBONE_LOWER)),
                CHEEK_RAISE_LEFT,
            ),
        ),
        rule(
            "cheek raise right",
            lt(
                diff(y(RIGHT_CHEEKBONE_UPPER), y(RIGHT_CHEEKBONE_LOWER)),
                CHEEK_RAISE_RIGHT,
            ),
        ),
        rule("eye narrow left", lt(left_eye_opening(), EYE_NARROW_LEFT)),
        rule("eye narrow right", lt(right_eye_opening(), EYE_NARROW_RIGHT)),
        rule("eye widen left", gt(left_eye_opening(), EYE_WIDEN_LEFT)),
        rule("eye widen right", gt(right_eye_opening(), EYE_WIDEN_RIGHT)),
        rule("eyebrow flash", gt(left_brow_gap(), EYEBROW_FLASH)),
        rule(
            "forehead furrow",
            lt(abs_diff(y(FOREHEAD_TOP), y(FOREHEAD_MID)), FOREHEAD_FURROW),
        ),
        rule(
            "temple tension",
            lt(abs_diff(x(LEFT_TEMPLE), x(RIGHT_TEMPLE)), TEMPLE_TENSION),
        ),
        rule("jaw clench", lt(jaw_level(), JAW_CLENCH)),
        rule(
            "mouth twist left",
            lt(diff(x(MOUTH_LEFT), x(MOUTH_RIGHT)), MOUTH_TWIST_LEFT),
        ),
        rule(
            "mouth twist right",
            lt(diff(x(MOUTH_RIGHT), x(MOUTH_LEFT)), MOUTH_TWIST_RIGHT),
        ),
        rule("nostril compress", lt(nostril_width(), NOSTRIL_COMPRESS)),
        rule("nostril dilate", gt(nostril_width(), NOSTRIL_DILATE)),
        rule(
            "chin dimple",
            gt(diff(y(CHIN_LOWER), y(CHIN_UPPER)), CHIN_DIMPLE),
        ),
        rule(
            "chin raise",
            lt(diff(y(CHIN_LOWER), y(CHIN_UPPER)), CHIN_RAISE),
        ),
        rule(
            "head shake",
            gt(abs_diff(x(LEFT_FACE_EDGE), x(RIGHT_FACE_EDGE)), HEAD_SHAKE),
        ),
        rule(
            "head nod",
            gt(abs_diff(y(FOREHEAD_TOP), y(CHIN)), HEAD_NOD),
        ),
        rule("ear wiggle left", gt(z(LEFT_FACE_EDGE), EAR_WIGGLE_LEFT)),
        rule("ear wiggle right", gt(z(RIGHT_FACE_EDGE), EAR_WIGGLE_RIGHT)),
        rule("eye flutter left", lt(left_eye_opening(), EYE_FLUTTER_LEFT)),
        rule("eye flutter right", lt(right_eye_opening(), EYE_FLUTTER_RIGHT)),
        rule(
            "micro smile",
            between(mouth_width(), MICRO_SMILE[0], MICRO_SMILE[1]),
        ),
        rule("micro frown", lt(mouth_width(), MICRO_FROWN)),
        rule(
            "eyebrow twitch left",
            between(
                left_brow_gap(),
                EYEBROW_TWITCH_LEFT[0],
                EYEBROW_TWITCH_LEFT[1],
            ),
        ),
        rule(
            "eyebrow twitch right",
            between(
                right_brow_gap(),
                EYEBROW_TWITCH_RIGHT[0],
                EYEBROW_TWITCH_RIGHT[1],
            ),
        ),
        rule("lip twitch left", lt(corner_skew(), LIP_TWITCH_LEFT)),
        rule(
            "lip twitch right",
            lt(diff(y(MOUTH_RIGHT), y(MOUTH_LEFT)), LIP_TWITCH_RIGHT),
        ),
        rule(
            "eye contact direct",
            lt(abs_diff(x(LEFT_IRIS), x(RIGHT_IRIS)), EYE_CONTACT_DIRECT),
        ),
        rule(
            "eye contact avoidance",
            gt(abs_diff(x(LEFT_IRIS), x(RIGHT_IRIS)), EYE_CONTACT_AVOIDANCE),
        ),
        rule(
            "pupil dilation",
            gt(abs_diff(y(LEFT_IRIS), y(RIGHT_IRIS)), PUPIL_DILATION),
        ),
        rule(
            "pupil constriction",
            lt(abs_diff(y(LEFT_IRIS), y(RIGHT_IRIS)), PUPIL_CONSTRICTION),
        ),
        both(
            "surprise full",
            gt(left_brow_gap(), SURPRISE_FULL[0]),
            gt(lip_gap(), SURPRISE_FULL[1]),
        ),
        both(
            "disgust expression",
            lt(upper_lip_lift(), DISGUST_EXPRESSION[0]),
            lt(nose_crease(), DISGUST_EXPRESSION[1]),
        ),
        both(
            "fear expression",
            gt(left_eye_opening(), FEAR_EXPRESSION[0]),
            gt(left_brow_gap(), FEAR_EXPRESSION[1]),
        ),
        both(
            "anger expression",
            lt(brow_spread(), ANGER_EXPRESSION[0]),
            lt(mouth_width(), ANGER_EXPRESSION[1]),
        ),
        both(
            "sadness expression",
            gt(left_corner_drop(), SADNESS_EXPRESSION[0]),
            gt(right_corner_drop(), SADNESS_EXPRESSION[1]),
        ),
        rule("contempt left", lt(corner_skew(), CONTEMPT_LEFT)),
        rule(
            "contempt right",
            lt(diff(y(MOUTH_RIGHT), y(MOUTH_LEFT)), CONTEMPT_RIGHT),
        ),
        both(
            "stress indicators",
            lt(brow_spread(), STRESS_INDICATORS[0]),
            lt(jaw_level(), STRESS_INDICATORS[1]),
        ),
        both(
            "relaxed expression",
            gt(left_eye_opening(), RELAXED_EXPRESSION[0]),
            gt(lip_gap(), RELAXED_EXPRESSION[1]),
        ),
        both(
            "concentration",
            lt(brow_spread(), CONCENTRATION[0]),
            lt(left_eye_opening(), CONCENTRATION[1]),
        ),
        both(
            "confusion",
            gt(left_brow_gap(), CONFUSION[0]),
            lt(right_brow_gap(), CONFUSION[1]),
        ),
        both(
            "skepticism",
            gt(left_brow_gap(), SKEPTICISM[0]),
            lt(mouth_width(), SKEPTICISM[1]),
        ),
        both(
            "amusement",
            gt(mouth_width(), AMUSEMENT[0]),
            lt(left_eye_opening(), AMUSEMENT[1]),
        ),
        both(
            "boredom",
            lt(left_eye_opening(), BOREDOM[0]),
            lt(lip_gap(), BOREDOM[1]),
        ),
        both(
            "excitement",
            gt(left_eye_opening(), EXCITEMENT[0]),
            gt(mouth_width(), EXCITEMENT[1]),
        ),
        both(
            "determination",
            lt(brow_spread(), DETERMINATION[0]),
            lt(jaw_level(), DETERMINATION[1]),
        ),
        both(
            "nervousness",
            lt(left_eye_opening(), NERVOUSNESS[0]),
            gt(corner_skew(), NERVOUSNESS[1]),
        ),
        both(
            "confidence",
            lt(chin_depth(), CONFIDENCE[0]),
            gt(mouth_width(), CONFIDENCE[1]),
        ),
        both(
            "insecurity",
            gt(chin_depth(), INSECURITY[0]),
            gt(face_edge_tilt(), INSECURITY[1]),
        ),
        both(
            "thoughtfulness",
            lt(brow_spread(), THOUGHTFULNESS[0]),
            gt(
                diff(y(UPPER_LIP_INNER), y(LOWER_LIP_INNER)),
                THOUGHTFULNESS[1],
            ),
        ),
        both(
            "disbelief",
            gt(left_brow_gap(), DISBELIEF[0]),
            gt(lip_gap(), DISBELIEF[1]),
        ),
        both(
            "empathy",
            gt(mouth_width(), EMPATHY[0]),
            gt(left_eye_opening(), EMPATHY[1]),
        ),
        both(
            "curiosity",
            gt(left_brow_gap(), CURIOSITY[0]),
            lt(head_drop(), CURIOSITY[1]),
        ),
        both(
            "anticipation",
            gt(left_eye_opening(), ANTICIPATION[0]),
            gt(lip_gap(), ANTICIPATION[1]),
        ),
        both(
            "relief",
            gt(mouth_width(), RELIEF[0]),
            gt(left_eye_opening(), RELIEF[1]),
        ),
        both(
            "frustration",
            lt(brow_spread(), FRUSTRATION[0]),
            lt(lip_gap(), FRUSTRATION[1]),
        ),
        both(
            "affection",
            gt(mouth_width(), AFFECTION[0]),
            gt(left_eye_opening(), AFFECTION[1]),
        ),
        both(
            "pride",
            lt(chin_depth(), PRIDE[0]),
            gt(mouth_width(), PRIDE[1]),
        ),
        both(
            "embarrassment",
            gt(head_drop(), EMBARRASSMENT[0]),
            lt(left_eye_opening(), EMBARRASSMENT[1]),
        ),
        both(
            "guilt",
            gt(head_drop(), GUILT[0]),
            lt(mouth_width(), GUILT[1]),
        ),
        both(
            "jealousy",
            lt(brow_spread(), JEALOUSY[0]),
            gt(corner_skew(), JEALOUSY[1]),
        ),
        both(
            "envy",
            lt(left_eye_opening(), ENVY[0]),
            lt(brow_spread(), ENVY[1]),
        ),
        both(
            "longing",
            gt(left_eye_opening(), LONGING[0]),
            gt(lip_gap(), LONGING[1]),
        ),
        both(
            "nostalgia",
            gt(mouth_width(), NOSTALGIA[0]),
            gt(head_drop(), NOSTALGIA[1]),
        ),
        both(
            "melancholy",
            gt(left_corner_drop(), MELANCHOLY[0]),
            lt(left_eye_opening(), MELANCHOLY[1]),
        ),
        both(
            "serenity",
            gt(left_eye_opening(), SERENITY[0]),
            gt(lip_gap(), SERENITY[1]),
        ),
        both(
            "euphoria",
            gt(mouth_width(), EUPHORIA[0]),
            gt(left_eye_opening(), EUPHORIA[1]),
        ),
        both(
            "despair",
            gt(left_corner_drop(), DESPAIR[0]),
            lt(left_eye_opening(), DESPAIR[1]),
        ),
        both(
            "hope",
            gt(mouth_width(), HOPE[0]),
            gt(left_brow_gap(), HOPE[1]),
        ),
        both(
            "resignation",
            lt(left_eye_opening(), RESIGNATION[0]),
            lt(lip_gap(), RESIGNATION[1]),
        ),
        both(
            "defiance",
            lt(chin_depth(), DEFIANCE[0]),
            lt(brow_spread(), DEFIANCE[1]),
        ),
        both(
            "submission",
            gt(head_drop(), SUBMISSION[0]),
            lt(left_eye_opening(), SUBMISSION[1]),
        ),
        both(
            "dominance",
            lt(chin_depth(), DOMINANCE[0]),
            lt(left_eye_opening(), DOMINANCE[1]),
        ),
        both(
            "vulnerability",
            gt(left_eye_opening(), VULNERABILITY[0]),
            gt(head_drop(), VULNERABILITY[1]),
        ),
        both(
            "strength",
            lt(jaw_level(), STRENGTH[0]),
            lt(chin_depth(), STRENGTH[1]),
        ),
        both(
            "weakness",
            gt(head_drop(), WEAKNESS[0]),
            gt(jaw_level(), WEAKNESS[1]),
        ),
        both(
            "alertness",
            gt(left_eye_opening(), ALERTNESS[0]),
            gt(left_brow_gap(), ALERTNESS[1]),
        ),
        both(
            "drowsiness",
            lt(left_eye_opening(), DROWSINESS[0]),
            gt(head_drop(), DROWSINESS[1]),
        ),
        both(
            "intensity",
            lt(left_eye_opening(), INTENSITY[0]),
            lt(brow_spread(), INTENSITY[1]),
        ),
        both(
            "gentleness",
            gt(mouth_width(), GENTLENESS[0]),
            gt(left_eye_opening(), GENTLENESS[1]),
        ),
    ]
}

/// Mean upper lid minus mean lower lid
fn eyelid_line() -> Measure {
    diff(
        mean([y(LEFT_EYE_TOP), y(RIGHT_EYE_TOP)]),
        mean([y(LEFT_EYE_BOTTOM), y(RIGHT_EYE_BOTTOM)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let rules = face_rules();
        let names: HashSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_every_rule_validates() {
        for rule in face_rules() {
            rule.validate()
                .unwrap_or_else(|e| panic!("{}: {e}", rule.name));
            assert_eq!(rule.subject, SubjectKind::Face);
        }
    }

    #[test]
    fn test_only_iris_rules_need_refined_mesh() {
        let needs_iris: Vec<String> = face_rules()
            .into_iter()
            .filter(|r| r.required_indices().iter().any(|i| *i >= 468))
            .map(|r| r.name)
            .collect();

        assert_eq!(
            needs_iris,
            vec![
                "eye roll up",
                "eye roll down",
                "eye contact direct",
                "eye contact avoidance",
                "pupil dilation",
                "pupil constriction",
            ]
        );
    }

    #[test]
    fn test_threshold_arity_matches_constants() {
        let rules = face_rules();
        let find = |name: &str| rules.iter().find(|r| r.name == name).unwrap();

        assert_eq!(find("mouth open").thresholds(), vec![MOUTH_OPEN]);
        assert_eq!(find("raised eyebrow").thresholds(), vec![0.06, 0.06]);
        assert_eq!(find("surprise full").thresholds(), SURPRISE_FULL.to_vec());
        assert_eq!(find("subtle smile").thresholds(), SUBTLE_SMILE.to_vec());
    }
}
