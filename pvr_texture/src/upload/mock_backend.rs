/// Mock backend for tests (no GPU required)
///
/// Records every call, keeps written bytes per sub-resource and can be told to
/// fail at any step.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::capability::BackendCapabilities;
use crate::error::Result;
use crate::pvr_bail;
use crate::texture::SubresourceIndex;
use crate::upload::backend::{NativeTexture, SubresourceRegion, TextureBackend, TextureInfo};

const SOURCE: &str = "pvr::upload::mock";

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub id: u64,
    pub info: TextureInfo,
    /// Bytes written per sub-resource
    pub subresources: FxHashMap<SubresourceIndex, Vec<u8>>,
    pub finalized: bool,
}

impl NativeTexture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

// ============================================================================
// Mock Backend
// ============================================================================

/// Steps at which the mock reports an error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockFaults {
    pub fail_allocate: bool,
    /// Fail the n-th `write_subresource` call (0-based, counted per backend)
    pub fail_write_at: Option<usize>,
    pub fail_finalize: bool,
}

/// Backend call, in the order received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Allocate(u64),
    Write { id: u64, index: SubresourceIndex, len: usize },
    Finalize(u64),
    Release(u64),
}

/// Backend that tracks created textures without a GPU
#[derive(Debug)]
pub struct MockBackend {
    capabilities: BackendCapabilities,
    pub faults: MockFaults,
    events: Vec<MockEvent>,
    live: FxHashSet<u64>,
    next_id: u64,
    writes: usize,
}

impl MockBackend {
    pub fn new(capabilities: BackendCapabilities) -> Self {
        Self::with_faults(capabilities, MockFaults::default())
    }

    pub fn with_faults(capabilities: BackendCapabilities, faults: MockFaults) -> Self {
        Self {
            capabilities,
            faults,
            events: Vec::new(),
            live: FxHashSet::default(),
            next_id: 1,
            writes: 0,
        }
    }

    /// Every call received so far
    pub fn events(&self) -> &[MockEvent] {
        &self.events
    }

    /// Textures allocated and not yet released
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }
}

impl TextureBackend for MockBackend {
    type Texture = MockTexture;

    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> &BackendCapabilities {
        &self.capabilities
    }

    fn allocate(&mut self, info: &TextureInfo) -> Result<MockTexture> {
        if self.faults.fail_allocate {
            pvr_bail!(AllocationFailure, SOURCE, "Injected allocation failure ({}x{})", info.width, info.height);
        }
        if !self.capabilities.supports(info.format) {
            pvr_bail!(AllocationFailure, SOURCE, "Format {} is not native to the mock backend", info.format.pixel_format);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.events.push(MockEvent::Allocate(id));
        Ok(MockTexture {
            id,
            info: info.clone(),
            subresources: FxHashMap::default(),
            finalized: false,
        })
    }

    fn write_subresource(&mut self, texture: &mut MockTexture, region: &SubresourceRegion, data: &[u8]) -> Result<()> {
        let call = self.writes;
        self.writes += 1;
        if self.faults.fail_write_at == Some(call) {
            pvr_bail!(UploadFailure, SOURCE, "Injected failure on write {}", call);
        }
        if !texture.info.contains(region.index) {
            pvr_bail!(UploadFailure, SOURCE, "Sub-resource {:?} is outside texture {}", region.index, texture.id);
        }
        let expected = texture.info.subresource_size(region.index.mip);
        if data.len() != expected {
            pvr_bail!(
                UploadFailure,
                SOURCE,
                "Sub-resource {:?} got {} bytes, expected {}",
                region.index, data.len(), expected
            );
        }
        self.events.push(MockEvent::Write { id: texture.id, index: region.index, len: data.len() });
        texture.subresources.insert(region.index, data.to_vec());
        Ok(())
    }

    fn finalize(&mut self, texture: &mut MockTexture) -> Result<()> {
        if self.faults.fail_finalize {
            pvr_bail!(UploadFailure, SOURCE, "Injected finalize failure on texture {}", texture.id);
        }
        self.events.push(MockEvent::Finalize(texture.id));
        texture.finalized = true;
        Ok(())
    }

    fn release(&mut self, texture: MockTexture) {
        self.live.remove(&texture.id);
        self.events.push(MockEvent::Release(texture.id));
    }
}

#[cfg(test)]
#[path = "mock_backend_tests.rs"]
mod tests;
