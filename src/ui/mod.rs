/// UI layer: one module per page section.
///
/// ```text
///   header / description     (panels)
///   composition table        (tables)
///   benchmark table          (tables)
///   structure selector + 3-D view   (viewer)
///   references               (panels)
/// ```
pub mod panels;
pub mod tables;
pub mod viewer;
