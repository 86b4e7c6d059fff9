use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use super::{MaterialKind, MaterialType};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;

struct CacheEntry {
    refs: usize,
    shared: Rc<dyn Any>,
}

/// Program-wide material resources, created on the first `acquire` of a kind and dropped on
/// its last `release`.
#[derive(Default)]
pub struct MaterialResourceCache {
    entries: HashMap<MaterialKind, CacheEntry>,
}

impl MaterialResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire<M: MaterialType>(&mut self, gpu: &GpuContext, assets: &mut Assets) -> Rc<M::Shared> {
        self.acquire_with::<M>(|| M::create_shared(gpu, assets))
    }

    pub fn acquire_with<M: MaterialType>(&mut self, create: impl FnOnce() -> M::Shared) -> Rc<M::Shared> {
        let entry = self.entries.entry(M::KIND).or_insert_with(|| {
            log::info!("Creating shared resources for {:?} material", M::KIND);
            CacheEntry {
                refs: 0,
                shared: Rc::new(create()),
            }
        });
        entry.refs += 1;

        match Rc::clone(&entry.shared).downcast::<M::Shared>() {
            Ok(shared) => shared,
            Err(_) => panic!("{:?} registered with a different shared type", M::KIND),
        }
    }

    /// Returns `true` when this was the last reference and the resources were dropped.
    pub fn release(&mut self, kind: MaterialKind) -> bool {
        let Some(entry) = self.entries.get_mut(&kind) else {
            log::warn!("Releasing {kind:?} material that was never acquired");
            return false;
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }
        self.entries.remove(&kind);
        log::info!("Dropped shared resources for {kind:?} material");
        true
    }

    pub fn ref_count(&self, kind: MaterialKind) -> usize {
        self.entries.get(&kind).map_or(0, |entry| entry.refs)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
