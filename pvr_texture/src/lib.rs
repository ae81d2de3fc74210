/*!
# PVR Texture

Texture asset decoding and native GPU upload for PowerVR-style pipelines.

This crate turns texture container files into a canonical, format-agnostic
descriptor and hands that descriptor to a GPU backend. Backends (Vulkan,
OpenGL ES) live in their own crates and implement the `TextureBackend` trait.

## Architecture

- **Formats**: PVR (v3 and legacy), KTX, DDS, BMP, TGA and XNB readers, plus a PVR v3 writer
- **TextureDescriptor**: canonical header + exclusively owned data buffer
- **Decompress**: PVRTC 2bpp/4bpp and ETC1/ETC2 block decoders to RGBA8888
- **Capability**: per-backend native format sets and upload negotiation
- **Upload**: backend-agnostic upload driver with cleanup on failure
- **AsyncLoader**: worker pool returning futures for load + decompress jobs
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod texture;
pub mod formats;
pub mod decompress;
pub mod capability;
pub mod upload;
pub mod async_loader;

// Main pvr namespace module
pub mod pvr {
    // Error types
    pub use crate::error::{Error, Result};

    // Global logging entry point
    pub use crate::engine::Engine;

    // Pipeline configuration
    pub use crate::config::Config;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Canonical texture types
    pub mod texture {
        pub use crate::texture::*;
    }

    // Container readers, writer and asset providers
    pub mod formats {
        pub use crate::formats::*;
    }

    // Block decompressors
    pub mod decompress {
        pub use crate::decompress::*;
    }

    // Capability negotiation
    pub mod capability {
        pub use crate::capability::*;
    }

    // Upload driver and backend trait
    pub mod upload {
        pub use crate::upload::*;
    }

    // Worker pool
    pub mod async_loader {
        pub use crate::async_loader::*;
    }
}
