//! # Maquette
//!
//! Image preparation and mask compositing for AI-assisted interior and
//! architecture visualization. Maquette fits source photos to the aspect
//! ratios a generation service expects, drives the generation call, and
//! merges generated patches back into the original shot through a feathered
//! mask, so a re-imagined sofa lands seamlessly in an untouched room.
//!
//! # Architecture: Pure Transforms Around an Opaque Service
//!
//! Everything interesting happens in pure functions over encoded payloads:
//!
//! ```text
//! file / data URL → ImagePayload → crop | pad | cut | composite → ImagePayload → disk
//!                                      ↘ generate (remote service) ↗
//! ```
//!
//! A transform decodes its inputs, does its pixel work on surfaces it owns,
//! and returns a freshly encoded payload. Inputs are never mutated and no
//! state survives a call, so concurrent invocations need no coordination and
//! the same inputs always reproduce the same output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`payload`] | Encoded images: media-type tag + bytes, base64/data-URL forms, decode/encode |
//! | [`imaging`] | The core: aspect-ratio geometry, surfaces, mask shaping, transforms |
//! | [`service`] | Client boundary for the remote generation API |
//! | [`config`] | `maquette.toml` loading, validation, stock generator |
//! | [`store`] | Content-hash-named result files |
//! | [`output`] | CLI summary formatting |
//!
//! # Design Decisions
//!
//! ## Lossless Outputs
//!
//! Every transform re-encodes as PNG. Transforms chain (pad, then generate,
//! then composite), and a lossy step in the middle would smear the seams the
//! mask compositor works hard to hide. The no-op paths skip re-encoding
//! entirely and hand back the input bytes.
//!
//! ## Explicit Surfaces
//!
//! Drawing happens on [`imaging::Surface`] buffers with checked allocation,
//! not on an ambient canvas. Each call allocates what it needs and drops it;
//! an unreasonable allocation is an error the caller sees, not an abort.
//!
//! ## Masks Are Data
//!
//! A mask is any image: luminance times alpha gives the blend weight. Growing
//! it is a real morphological dilation (disk maximum), feathering is a
//! Gaussian blur. Pixels the mask never touches are bit-identical to the
//! background in the result; that is the compositor's core guarantee.
//!
//! ## One Blocking Generation Call
//!
//! The service client is deliberately synchronous: a CLI invocation prepares
//! inputs, makes one call, writes results. The service stays behind the
//! [`service::ImageService`] trait, so tests run against a recording mock and
//! never touch the network.

pub mod config;
pub mod imaging;
pub mod output;
pub mod payload;
pub mod service;
pub mod store;
