use crate::math::{Box2D, Point};

/// An accumulating, possibly-empty axis-aligned bounding region.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Envelope {
    bounds: Option<Box2D>,
}

impl Envelope {
    #[inline]
    pub fn new() -> Self {
        Envelope { bounds: None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    #[inline]
    pub fn as_box(&self) -> Option<&Box2D> {
        self.bounds.as_ref()
    }

    #[inline]
    pub fn reset(&mut self) {
        self.bounds = None;
    }

    pub fn add_point(&mut self, p: Point) {
        match &mut self.bounds {
            Some(b) => {
                b.min.x = b.min.x.min(p.x);
                b.min.y = b.min.y.min(p.y);
                b.max.x = b.max.x.max(p.x);
                b.max.y = b.max.y.max(p.y);
            }
            None => self.bounds = Some(Box2D::new(p, p)),
        }
    }

    pub fn add_box(&mut self, other: &Box2D) {
        self.add_point(other.min);
        self.add_point(other.max);
    }

    /// Grows this envelope to the covering rectangle of both envelopes.
    pub fn union(&mut self, other: &Envelope) {
        if let Some(b) = &other.bounds {
            // Copy first: `other` may alias `self`.
            let b = *b;
            self.add_box(&b);
        }
    }
}
