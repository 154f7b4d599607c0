/// How the recognition service should interpret submitted audio, resolved
/// once before any call.
///
/// `AutoDetect` lets the service sniff the container (used for the
/// recognizer's default config); `ExplicitPcm16kMono` pins raw LINEAR16 at
/// 16 kHz mono, the shape recognize requests submit clip frames in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodingConfig {
    AutoDetect,
    ExplicitPcm16kMono,
}
