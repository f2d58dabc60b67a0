/// Errors produced while interpolating a task or partial's source
/// against its bound context (C8).
///
/// ```text
///   InterpolateError
///   ├── RecursionLimitExceeded  ← partial(self) chain too deep
///   ├── InvalidIdentifier       ← a `locals` key isn't a valid identifier
///   ├── ReservedIdentifier      ← a `locals` key collides with `ctxName`
///   └── EvalFailed              ← the expression itself failed to evaluate
/// ```
#[derive(Debug, thiserror::Error)]
pub enum InterpolateError {
    #[error("interpolation recursion limit ({limit}) exceeded; chain: {chain}")]
    RecursionLimitExceeded { limit: usize, chain: String },

    #[error("`{key}` is not a valid identifier for a locals binding")]
    InvalidIdentifier { key: String },

    #[error("locals key `{key}` collides with the context binding name")]
    ReservedIdentifier { key: String },

    #[error("failed to evaluate `${{{expr}}}`: {message}")]
    EvalFailed { expr: String, message: String },
}

/// Surfaced at plan construction when the dependency graph contains a
/// cycle (§7 DAGCycle).
#[derive(Debug, thiserror::Error)]
#[error("dependency graph contains {} cycle(s): {cycles:?}", cycles.len())]
pub struct PlanError {
    pub cycles: Vec<Vec<String>>,
}
