/// Sampling settings sent with every completion request
#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_tokens: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 1000,
        }
    }
}
