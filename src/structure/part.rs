use nalgebra::{Point3, Vector4};

use crate::{curve::NurbsCurve, misc::FloatingPoint, surface::NurbsSurface};

use super::{Segment, SegmentSamples, SegmentType};

/// Geometry carried by a part
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartGeometry<T: FloatingPoint> {
    Curve(NurbsCurve<T>),
    Sheet(NurbsSurface<T>),
}

impl<T: FloatingPoint> PartGeometry<T> {
    fn segment(&self) -> &dyn Segment<T> {
        match self {
            PartGeometry::Curve(c) => c,
            PartGeometry::Sheet(s) => s,
        }
    }
}

/// A node of a shape graph: one segment of a 3D shape
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Part<T: FloatingPoint> {
    id: String,
    geometry: PartGeometry<T>,
}

impl<T: FloatingPoint> Part<T> {
    pub fn new(id: impl Into<String>, geometry: PartGeometry<T>) -> Self {
        Self {
            id: id.into(),
            geometry,
        }
    }

    pub fn curve(id: impl Into<String>, curve: NurbsCurve<T>) -> Self {
        Self::new(id, PartGeometry::Curve(curve))
    }

    pub fn sheet(id: impl Into<String>, sheet: NurbsSurface<T>) -> Self {
        Self::new(id, PartGeometry::Sheet(sheet))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn geometry(&self) -> &PartGeometry<T> {
        &self.geometry
    }
}

impl<T: FloatingPoint> Segment<T> for Part<T> {
    fn segment_type(&self) -> SegmentType {
        self.geometry.segment().segment_type()
    }

    fn area(&self) -> T {
        self.geometry.segment().area()
    }

    fn center(&self) -> Point3<T> {
        self.geometry.segment().center()
    }

    fn position(&self, coord: &Vector4<T>) -> Point3<T> {
        self.geometry.segment().position(coord)
    }

    fn min_coord(&self) -> Vector4<T> {
        self.geometry.segment().min_coord()
    }

    fn max_coord(&self) -> Vector4<T> {
        self.geometry.segment().max_coord()
    }

    fn discretize(&self, step: T, max_samples: usize) -> SegmentSamples<T> {
        self.geometry.segment().discretize(step, max_samples)
    }
}
