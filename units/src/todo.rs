/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// This may be because:
///
/// + We do not know how to implement them in `uom`.
///
/// + They appear in tight numerical loops (ray tracing, filtering,
///   back-projection) where we use plain `f32`s, but still want some clues in
///   the source as to what they represent.

pub type Lengthf32    = f32; // millimetres
pub type Anglef32     = f32; // radians
pub type Ratiof32     = f32;
pub type PerLengthf32 = f32; // TODO uom PerLength (linear attenuation coefficient)
pub type Densityf32   = f32; // TODO uom MassDensity (g / cm^3 after calibration)
pub type Intensityf32 = f32; // TODO uom Intensity
pub type Countf32     = f32; // photon counts
