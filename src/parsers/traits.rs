use crate::errors::FlipResult;

pub trait Locator {
    type Output;

    fn locate(&self, content: &str) -> FlipResult<Vec<Self::Output>>;

    fn is_supported(filename: Option<&str>, content: &str) -> bool;
}
