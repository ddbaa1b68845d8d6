#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Load the roster and the type weakness index.
    Initialize,
    LoadRandomBatch { count: usize, generation: u64 },
    LookupPokemon { query: String, generation: u64 },
}
