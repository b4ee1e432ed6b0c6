//! Graded body-language primitives over pose (33 points) and hand (21 points) sets.
//!
//! Unlike the facial rules these award partial credit: each clause that holds
//! adds its weight to the rule's confidence. Motion-dependent fidgeting is not
//! a rule since it needs frame history; see the analysis crate.

use visage_core::landmarks::{hand, pose};
use visage_core::SubjectKind;

use crate::rule::*;

pub mod thresholds {
    /// Wrist x gap, elbow y gap, then the arm angle window in degrees
    pub const CROSSED_ARMS: [f64; 4] = [0.3, 0.1, 70.0, 110.0];
    pub const HANDS_ON_HIPS: [f64; 2] = [0.15, 0.15];
    /// Wrist-to-shoulder width ratio, then wrist height tolerance
    pub const ARMS_OPEN: [f64; 3] = [1.5, 0.3, 0.3];
    pub const HUNCHED_SHOULDERS: f64 = -0.1;
    pub const FEET_TOGETHER: f64 = 0.1;
    pub const UPRIGHT_POSTURE: f64 = 0.1;
    pub const LEANING_FORWARD: f64 = 0.1;
    pub const LEANING_BACK: f64 = -0.1;
    pub const CROSSED_LEGS: [f64; 2] = [0.1, 0.15];
    pub const WIDE_STANCE: f64 = 1.3;
    pub const CLOSED_STANCE: f64 = 0.08;
    pub const HAND_TO_FACE: [f64; 2] = [0.2, 0.2];
    pub const HAND_TO_NECK: [f64; 2] = [0.15, 0.15];
    pub const HAND_TO_CHEST: [f64; 2] = [0.15, 0.15];
    pub const COVERING_MOUTH: [f64; 2] = [0.1, 0.1];
    pub const COVERING_EYES: [f64; 2] = [0.1, 0.1];

    /// Vertical offset of the neck and chest targets from the shoulder midpoint
    pub const NECK_OFFSET: f64 = -0.1;
    pub const CHEST_OFFSET: f64 = 0.1;
    pub const MOUTH_OFFSET: f64 = 0.05;
    pub const EYES_OFFSET: f64 = -0.03;

    /// Index tip to knuckle, then tip to middle joint
    pub const POINTING: [f64; 2] = [0.15, 0.08];
    pub const OPEN_PALMS: f64 = 0.2;
    pub const CLENCHED_FISTS: f64 = 0.15;
}

use thresholds::*;

use pose::{
    LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, NOSE, RIGHT_ANKLE,
    RIGHT_ELBOW, RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};

fn shoulder_width() -> Measure {
    abs_diff(x(LEFT_SHOULDER), x(RIGHT_SHOULDER))
}

fn ankle_width() -> Measure {
    abs_diff(x(LEFT_ANKLE), x(RIGHT_ANKLE))
}

/// Nose x minus hip centre x; positive when leaning toward the camera's right
fn torso_lean() -> Measure {
    diff(x(NOSE), mean([x(LEFT_HIP), x(RIGHT_HIP)]))
}

/// Either wrist within `limits` of a target point
fn wrist_near(target: PointRef, limits: [f64; 2]) -> Condition {
    any([
        lt(distance(landmark(LEFT_WRIST), target.clone()), limits[0]),
        lt(distance(landmark(RIGHT_WRIST), target), limits[1]),
    ])
}

fn shoulder_point(dy: f64) -> PointRef {
    offset([LEFT_SHOULDER, RIGHT_SHOULDER], 0.0, dy)
}

fn face_point(dy: f64) -> PointRef {
    offset([NOSE], 0.0, dy)
}

fn pose_rule(name: &str, clauses: impl IntoIterator<Item = (Condition, f64)>) -> RuleSpec {
    RuleSpec::graded(name, SubjectKind::Pose, clauses)
}

/// Pose primitives feeding the body-language categories
pub fn pose_rules() -> Vec<RuleSpec> {
    vec![
        pose_rule(
            "crossed_arms",
            [
                (lt(abs_diff(x(LEFT_WRIST), x(RIGHT_WRIST)), CROSSED_ARMS[0]), 0.4),
                (lt(abs_diff(y(LEFT_ELBOW), y(RIGHT_ELBOW)), CROSSED_ARMS[1]), 0.3),
                (
                    all([
                        between(
                            angle(LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
                            CROSSED_ARMS[2],
                            CROSSED_ARMS[3],
                        ),
                        between(
                            angle(RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
                            CROSSED_ARMS[2],
                            CROSSED_ARMS[3],
                        ),
                    ]),
                    0.3,
                ),
            ],
        ),
        pose_rule(
            "hands_on_hips",
            [
                (lt(dist(LEFT_WRIST, LEFT_HIP), HANDS_ON_HIPS[0]), 0.5),
                (lt(dist(RIGHT_WRIST, RIGHT_HIP), HANDS_ON_HIPS[1]), 0.5),
            ],
        ),
        pose_rule(
            "arms_open",
            [
                (
                    gt(
                        ratio(abs_diff(x(LEFT_WRIST), x(RIGHT_WRIST)), shoulder_width()),
                        ARMS_OPEN[0],
                    ),
                    0.6,
                ),
                (
                    all([
                        lt(abs_diff(y(LEFT_WRIST), y(LEFT_SHOULDER)), ARMS_OPEN[1]),
                        lt(abs_diff(y(RIGHT_WRIST), y(RIGHT_SHOULDER)), ARMS_OPEN[2]),
                    ]),
                    0.4,
                ),
            ],
        ),
        pose_rule(
            "hunched_shoulders",
            [(
                lt(
                    diff(mean([y(LEFT_SHOULDER), y(RIGHT_SHOULDER)]), y(NOSE)),
                    HUNCHED_SHOULDERS,
                ),
                1.0,
            )],
        ),
        pose_rule("feet_together", [(lt(ankle_width(), FEET_TOGETHER), 1.0)]),
        pose_rule(
            "upright_posture",
            [(lt(abs(torso_lean()), UPRIGHT_POSTURE), 1.0)],
        ),
        pose_rule("leaning_forward", [(gt(torso_lean(), LEANING_FORWARD), 0.8)]),
        pose_rule("leaning_back", [(lt(torso_lean(), LEANING_BACK), 0.8)]),
        pose_rule(
            "crossed_legs",
            [
                (
                    gt(
                        abs_diff(
                            abs_diff(x(LEFT_KNEE), x(LEFT_ANKLE)),
                            abs_diff(x(RIGHT_KNEE), x(RIGHT_ANKLE)),
                        ),
                        CROSSED_LEGS[0],
                    ),
                    0.5,
                ),
                (lt(ankle_width(), CROSSED_LEGS[1]), 0.5),
            ],
        ),
        pose_rule(
            "wide_stance",
            [(gt(ratio(ankle_width(), shoulder_width()), WIDE_STANCE), 0.8)],
        ),
        pose_rule("closed_stance", [(lt(ankle_width(), CLOSED_STANCE), 0.8)]),
        pose_rule(
            "hand_to_face",
            [(wrist_near(landmark(NOSE), HAND_TO_FACE), 0.7)],
        ),
        pose_rule(
            "hand_to_neck",
            [(wrist_near(shoulder_point(NECK_OFFSET), HAND_TO_NECK), 0.7)],
        ),
        pose_rule(
            "hand_to_chest",
            [(wrist_near(shoulder_point(CHEST_OFFSET), HAND_TO_CHEST), 0.7)],
        ),
        pose_rule(
            "covering_mouth",
            [(wrist_near(face_point(MOUTH_OFFSET), COVERING_MOUTH), 0.8)],
        ),
        pose_rule(
            "covering_eyes",
            [(wrist_near(face_point(EYES_OFFSET), COVERING_EYES), 0.8)],
        ),
    ]
}

fn hand_rule(name: &str, clauses: impl IntoIterator<Item = (Condition, f64)>) -> RuleSpec {
    RuleSpec::graded(name, SubjectKind::Hand, clauses)
}

/// Per-hand gestures; each hand contributes half credit
pub fn hand_rules() -> Vec<RuleSpec> {
    vec![
        hand_rule(
            "pointing",
            [(
                all([
                    gt(dist(hand::INDEX_TIP, hand::INDEX_MCP), POINTING[0]),
                    gt(dist(hand::INDEX_TIP, hand::INDEX_PIP), POINTING[1]),
                ]),
                0.5,
            )],
        ),
        hand_rule(
            "open_palms",
            [(gt(dist(hand::THUMB_TIP, hand::PINKY_TIP), OPEN_PALMS), 0.5)],
        ),
        hand_rule(
            "clenched_fists",
            [(
                lt(mean_distance(hand::FINGERTIPS, hand::WRIST), CLENCHED_FISTS),
                0.5,
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::LandmarkSet;

    /// Neutral standing pose: shoulders 0.2 apart, hands hanging by the hips
    pub(crate) fn standing_pose() -> Vec<[f64; 3]> {
        let mut points = vec![[0.5, 0.5, 0.0]; pose::LEN];
        points[NOSE] = [0.5, 0.2, 0.0];
        points[LEFT_SHOULDER] = [0.4, 0.35, 0.0];
        points[RIGHT_SHOULDER] = [0.6, 0.35, 0.0];
        points[LEFT_ELBOW] = [0.38, 0.5, 0.0];
        points[RIGHT_ELBOW] = [0.62, 0.5, 0.0];
        points[LEFT_WRIST] = [0.37, 0.8, 0.0];
        points[RIGHT_WRIST] = [0.63, 0.8, 0.0];
        points[LEFT_HIP] = [0.45, 0.65, 0.0];
        points[RIGHT_HIP] = [0.55, 0.65, 0.0];
        points[LEFT_KNEE] = [0.45, 0.8, 0.0];
        points[RIGHT_KNEE] = [0.55, 0.8, 0.0];
        points[LEFT_ANKLE] = [0.45, 0.95, 0.0];
        points[RIGHT_ANKLE] = [0.55, 0.95, 0.0];
        points
    }

    fn confidence(rules: &[RuleSpec], name: &str, set: &LandmarkSet) -> f64 {
        rules
            .iter()
            .find(|r| r.name == name)
            .unwrap()
            .confidence(set)
            .unwrap()
    }

    #[test]
    fn test_all_rules_validate() {
        for rule in pose_rules().iter().chain(hand_rules().iter()) {
            rule.validate()
                .unwrap_or_else(|e| panic!("{}: {e}", rule.name));
        }
    }

    #[test]
    fn test_arms_open_pose() {
        let mut points = standing_pose();
        points[LEFT_WRIST] = [0.1, 0.4, 0.0];
        points[RIGHT_WRIST] = [0.9, 0.4, 0.0];
        let set = LandmarkSet::from_triples(SubjectKind::Pose, 0, &points);

        let rules = pose_rules();
        assert!((confidence(&rules, "arms_open", &set) - 1.0).abs() < 1e-9);
        assert_eq!(confidence(&rules, "hand_to_face", &set), 0.0);
    }

    #[test]
    fn test_hand_over_mouth() {
        let mut points = standing_pose();
        points[RIGHT_WRIST] = [0.5, 0.26, 0.0];
        let set = LandmarkSet::from_triples(SubjectKind::Pose, 0, &points);

        let rules = pose_rules();
        assert_eq!(confidence(&rules, "covering_mouth", &set), 0.8);
        assert_eq!(confidence(&rules, "hand_to_face", &set), 0.7);
    }

    #[test]
    fn test_leaning() {
        let mut points = standing_pose();
        points[NOSE] = [0.7, 0.2, 0.0];
        let set = LandmarkSet::from_triples(SubjectKind::Pose, 0, &points);

        let rules = pose_rules();
        assert_eq!(confidence(&rules, "leaning_forward", &set), 0.8);
        assert_eq!(confidence(&rules, "leaning_back", &set), 0.0);
        assert_eq!(confidence(&rules, "upright_posture", &set), 0.0);
    }

    #[test]
    fn test_fist_and_open_hand() {
        let fist = LandmarkSet::from_triples(SubjectKind::Hand, 0, &[[0.5, 0.5, 0.0]; hand::LEN]);
        let rules = hand_rules();
        assert_eq!(confidence(&rules, "clenched_fists", &fist), 0.5);
        assert_eq!(confidence(&rules, "open_palms", &fist), 0.0);

        let mut spread = [[0.5, 0.5, 0.0]; hand::LEN];
        spread[hand::THUMB_TIP] = [0.2, 0.4, 0.0];
        spread[hand::PINKY_TIP] = [0.8, 0.4, 0.0];
        let open = LandmarkSet::from_triples(SubjectKind::Hand, 1, &spread);
        assert_eq!(confidence(&rules, "open_palms", &open), 0.5);
    }
}
