//! Pose and axis types shared by drivers and the command layer.
//!
//! This module defines:
//! - `PoseKind` - Which representation a pose vector uses
//! - `AxisLabel` - Single-character axis labels accepted on the wire
//! - `Pose` - A six-slot pose vector tagged with its representation
//! - `ErrorCode` - Device fault register value

use super::consts::AXIS_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device fault register value. Zero means no fault.
pub type ErrorCode = i32;

/// Pose representation.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoseKind {
    /// Joint angles in degrees, labels `1`..`6`.
    Angles,
    /// Cartesian coordinates: `X Y Z` in millimetres, `A B C` in degrees.
    #[default]
    Coords,
}

impl PoseKind {
    /// Labels valid for this representation, in slot order.
    pub const fn labels(self) -> [AxisLabel; AXIS_COUNT] {
        match self {
            Self::Angles => [
                AxisLabel::J1,
                AxisLabel::J2,
                AxisLabel::J3,
                AxisLabel::J4,
                AxisLabel::J5,
                AxisLabel::J6,
            ],
            Self::Coords => [
                AxisLabel::X,
                AxisLabel::Y,
                AxisLabel::Z,
                AxisLabel::A,
                AxisLabel::B,
                AxisLabel::C,
            ],
        }
    }
}

impl fmt::Display for PoseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angles => write!(f, "angles"),
            Self::Coords => write!(f, "coords"),
        }
    }
}

/// Axis label as it appears at the start of a move token.
///
/// The set is fixed: six cartesian labels and six joint labels. Which half
/// is usable depends on the active [`PoseKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisLabel {
    /// Cartesian X.
    X,
    /// Cartesian Y.
    Y,
    /// Cartesian Z.
    Z,
    /// Rotation about X.
    A,
    /// Rotation about Y.
    B,
    /// Rotation about Z.
    C,
    /// Joint 1.
    J1,
    /// Joint 2.
    J2,
    /// Joint 3.
    J3,
    /// Joint 4.
    J4,
    /// Joint 5.
    J5,
    /// Joint 6.
    J6,
}

impl AxisLabel {
    /// Map an (uppercase) label character to its axis.
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            '1' => Some(Self::J1),
            '2' => Some(Self::J2),
            '3' => Some(Self::J3),
            '4' => Some(Self::J4),
            '5' => Some(Self::J5),
            '6' => Some(Self::J6),
            _ => None,
        }
    }

    /// The label character.
    pub const fn as_char(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::J1 => '1',
            Self::J2 => '2',
            Self::J3 => '3',
            Self::J4 => '4',
            Self::J5 => '5',
            Self::J6 => '6',
        }
    }

    /// Representation this label belongs to.
    pub const fn kind(self) -> PoseKind {
        match self {
            Self::X | Self::Y | Self::Z | Self::A | Self::B | Self::C => PoseKind::Coords,
            _ => PoseKind::Angles,
        }
    }

    /// Slot index within a pose of [`AxisLabel::kind`].
    pub const fn slot(self) -> usize {
        match self {
            Self::X | Self::J1 => 0,
            Self::Y | Self::J2 => 1,
            Self::Z | Self::J3 => 2,
            Self::A | Self::J4 => 3,
            Self::B | Self::J5 => 4,
            Self::C | Self::J6 => 5,
        }
    }

    /// Joint label for a 1-based joint number.
    pub const fn joint(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::J1),
            2 => Some(Self::J2),
            3 => Some(Self::J3),
            4 => Some(Self::J4),
            5 => Some(Self::J5),
            6 => Some(Self::J6),
            _ => None,
        }
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A pose vector tagged with its representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pose {
    /// Representation of `values`.
    pub kind: PoseKind,
    /// Slot values in label order.
    pub values: [i32; AXIS_COUNT],
}

impl Pose {
    /// Pose with every slot at zero.
    pub const fn zero(kind: PoseKind) -> Self {
        Self {
            kind,
            values: [0; AXIS_COUNT],
        }
    }

    /// Joint-angle pose.
    pub const fn angles(values: [i32; AXIS_COUNT]) -> Self {
        Self {
            kind: PoseKind::Angles,
            values,
        }
    }

    /// Cartesian pose.
    pub const fn coords(values: [i32; AXIS_COUNT]) -> Self {
        Self {
            kind: PoseKind::Coords,
            values,
        }
    }

    /// Value of `label`, if it belongs to this pose's representation.
    pub fn get(&self, label: AxisLabel) -> Option<i32> {
        (label.kind() == self.kind).then(|| self.values[label.slot()])
    }

    /// Overwrite the slot for `label`.
    ///
    /// Returns `false` and leaves the pose untouched when the label belongs
    /// to the other representation.
    pub fn apply(&mut self, label: AxisLabel, value: i32) -> bool {
        if label.kind() != self.kind {
            return false;
        }
        self.values[label.slot()] = value;
        true
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.kind, self.values)
    }
}
