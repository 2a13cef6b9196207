mod make_box;
mod make_cylinder;

pub use make_box::MakeBox;
pub use make_cylinder::MakeCylinder;
