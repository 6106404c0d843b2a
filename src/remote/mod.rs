/// Remote generative-image backends
///
/// Currently only the Gemini `generateContent` API (gemini.rs).

pub mod gemini;
