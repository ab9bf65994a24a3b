pub mod time;

/// Generates an invocation id.
pub fn shortid() -> String {
    nanoid::nanoid!(12)
}
