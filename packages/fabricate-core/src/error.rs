//! [`RenderError`]: the Structural error kind from §7.

/// Fatal, pre-apply errors raised by the renderer (§7 "Structural").
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error(
        "sibling construct `{construct_type}` under `{parent_path}` appears more than once \
         without a user-supplied key"
    )]
    DuplicateSiblingConstruct {
        parent_path: String,
        construct_type: String,
    },

    #[error("instance id `{0}` was produced more than once in the same render pass")]
    DuplicateId(String),

    #[error("construct `{construct_type}` is missing required prop `{prop}`")]
    MissingRequiredProp { construct_type: String, prop: String },
}

/// Carries a [`RenderError`] across a panic boundary: component render bodies run inside a
/// reactive effect, which cannot return a `Result`, so structural errors detected mid-render are
/// raised as a panic of this type and converted back to a `Result` at [`crate::render::run`].
#[derive(Debug, Clone)]
pub struct StructuralPanic(pub RenderError);
