//! Positional landmark indices used by the built-in rule bank.

/// Face mesh indices (468 points; 468..478 are refined iris points)
pub mod face {
    pub const UPPER_LIP_TOP: usize = 0;
    pub const NOSE_BRIDGE: usize = 6;
    pub const GLABELLA: usize = 9;
    pub const FOREHEAD_TOP: usize = 10;
    pub const UPPER_LIP_OUTER: usize = 12;
    pub const UPPER_LIP_INNER: usize = 13;
    pub const LOWER_LIP_INNER: usize = 14;
    pub const LOWER_LIP_OUTER: usize = 15;
    pub const LOWER_LIP_BOTTOM: usize = 17;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_CHEEK: usize = 50;
    pub const LEFT_INNER_BROW: usize = 55;
    pub const MOUTH_LEFT: usize = 61;
    pub const LEFT_BROW: usize = 65;
    pub const NOSE_TIP_LEFT: usize = 94;
    pub const LEFT_FOREHEAD: usize = 109;
    pub const LEFT_CHEEKBONE_UPPER: usize = 116;
    pub const LEFT_CHEEKBONE_LOWER: usize = 117;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_BOTTOM: usize = 145;
    pub const FOREHEAD_MID: usize = 151;
    pub const CHIN: usize = 152;
    pub const LEFT_EYE_TOP: usize = 159;
    pub const LEFT_TEMPLE: usize = 162;
    pub const NOSE_ROOT: usize = 168;
    pub const LEFT_JAW: usize = 172;
    pub const CHIN_LOWER: usize = 175;
    pub const CHIN_UPPER: usize = 199;
    pub const LEFT_FACE_EDGE: usize = 234;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_CHEEK: usize = 280;
    pub const RIGHT_INNER_BROW: usize = 285;
    pub const MOUTH_RIGHT: usize = 291;
    pub const RIGHT_BROW: usize = 295;
    pub const NOSE_TIP_RIGHT: usize = 331;
    pub const RIGHT_FOREHEAD: usize = 338;
    pub const RIGHT_CHEEKBONE_UPPER: usize = 345;
    pub const RIGHT_CHEEKBONE_LOWER: usize = 346;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_BOTTOM: usize = 374;
    pub const RIGHT_EYE_TOP: usize = 386;
    pub const RIGHT_TEMPLE: usize = 389;
    pub const RIGHT_JAW: usize = 397;
    pub const RIGHT_FACE_EDGE: usize = 454;
    pub const LEFT_IRIS: usize = 468;
    pub const RIGHT_IRIS: usize = 473;
    pub const RIGHT_IRIS_EDGE: usize = 474;

    /// Semantically key points compared by the significance gate
    pub const KEY_INDICES: [usize; 13] = [
        MOUTH_LEFT,
        MOUTH_RIGHT,
        LEFT_BROW,
        RIGHT_BROW,
        LEFT_EYE_TOP,
        RIGHT_EYE_TOP,
        LEFT_EYE_BOTTOM,
        RIGHT_EYE_BOTTOM,
        NOSE_BRIDGE,
        NOSE_ROOT,
        CHIN,
        LEFT_JAW,
        RIGHT_JAW,
    ];

    /// Point count with refined iris landmarks
    pub const REFINED_LEN: usize = 478;
}

/// Body pose indices (33 points)
pub mod pose {
    pub const NOSE: usize = 0;
    pub const LEFT_EYE_INNER: usize = 1;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;

    pub const LEN: usize = 33;
}

/// Hand indices (21 points)
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;

    pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

    pub const LEN: usize = 21;
}
