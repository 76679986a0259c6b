/*!
    Stream roles and stream information.
*/

use std::fmt;

use crate::{CodecId, PixelFormat, Rational};

/**
    The part of a logical frame a sub-stream carries.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamRole {
    Color,
    Alpha,
    Depth,
}

impl StreamRole {
    pub const ALL: [StreamRole; 3] = [Self::Color, Self::Alpha, Self::Depth];

    pub const fn index(self) -> usize {
        match self {
            Self::Color => 0,
            Self::Alpha => 1,
            Self::Depth => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Alpha => "alpha",
            Self::Depth => "depth",
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/**
    A set of stream roles.

    Used both for the capabilities a source is configured with (which roles
    must be present to form a logical frame) and for tracking which roles a
    decode cycle has satisfied so far.
*/
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: Self = Self(0);
    pub const COLOR: Self = Self(StreamRole::Color.bit());
    pub const COLOR_ALPHA: Self = Self(StreamRole::Color.bit() | StreamRole::Alpha.bit());
    pub const COLOR_DEPTH: Self = Self(StreamRole::Color.bit() | StreamRole::Depth.bit());
    pub const ALL: Self =
        Self(StreamRole::Color.bit() | StreamRole::Alpha.bit() | StreamRole::Depth.bit());

    pub const fn only(role: StreamRole) -> Self {
        Self(role.bit())
    }

    pub const fn contains(self, role: StreamRole) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn insert(&mut self, role: StreamRole) {
        self.0 |= role.bit();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_superset_of(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Roles in `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = StreamRole> {
        StreamRole::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<StreamRole> for RoleSet {
    fn from_iter<I: IntoIterator<Item = StreamRole>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(StreamRole::name).collect();
        f.write_str(&names.join("+"))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleSet({self})")
    }
}

/**
    Information about one video stream in a container.
*/
#[derive(Clone, Debug)]
pub struct StreamInfo {
    /// Index of the stream inside the container.
    pub index: usize,
    /// Codec used.
    pub codec_id: CodecId,
    /// Pixel format declared by the container.
    pub pixel_format: PixelFormat,
    /// Coded width in pixels.
    pub width: u32,
    /// Coded height in pixels.
    pub height: u32,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Role assigned to this stream, if any.
    pub role: Option<StreamRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_set_membership() {
        let mut set = RoleSet::EMPTY;
        assert!(set.is_empty());
        set.insert(StreamRole::Color);
        set.insert(StreamRole::Depth);
        assert_eq!(set, RoleSet::COLOR_DEPTH);
        assert!(set.contains(StreamRole::Depth));
        assert!(!set.contains(StreamRole::Alpha));
        assert!(RoleSet::ALL.is_superset_of(set));
        assert!(!set.is_superset_of(RoleSet::ALL));
    }

    #[test]
    fn role_set_difference_and_display() {
        let missing = RoleSet::ALL.difference(RoleSet::COLOR);
        assert_eq!(missing.to_string(), "alpha+depth");
        assert_eq!(RoleSet::EMPTY.to_string(), "none");
        assert_eq!(
            missing.iter().collect::<Vec<_>>(),
            vec![StreamRole::Alpha, StreamRole::Depth]
        );
    }

    #[test]
    fn role_set_from_iter() {
        let set: RoleSet = [StreamRole::Alpha, StreamRole::Color].into_iter().collect();
        assert_eq!(set, RoleSet::COLOR_ALPHA);
    }
}
