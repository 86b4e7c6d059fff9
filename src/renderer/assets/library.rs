use std::collections::HashMap;

use crate::renderer::context::GpuContext;

/// A CPU-side asset that knows how to create its GPU counterpart.
pub trait UploadToGpu {
    type Gpu: GpuAsset;

    fn upload_to_gpu(&self, gpu: &GpuContext, label: &str) -> Self::Gpu;
}

/// GPU handles stored in a library are cheap clones sharing one allocation.
pub trait GpuAsset: Clone {
    fn is_valid(&self) -> bool;
    fn release(&mut self);
}

/// Name-keyed store of uploaded assets.
pub struct AssetLibrary<C: UploadToGpu> {
    items: HashMap<String, C::Gpu>,
}

impl<C: UploadToGpu> Default for AssetLibrary<C> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<C: UploadToGpu> AssetLibrary<C> {
    pub fn exists(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Returns a handle sharing the stored GPU asset.
    pub fn get(&self, id: &str) -> Option<C::Gpu> {
        self.items.get(id).cloned()
    }

    /// Uploads `asset` under `id`, replacing (and releasing) any previous entry.
    pub fn add(&mut self, gpu: &GpuContext, id: &str, asset: &C) -> C::Gpu {
        let uploaded = asset.upload_to_gpu(gpu, id);
        self.insert(id, uploaded.clone());
        uploaded
    }

    /// Returns the stored asset, uploading the one produced by `make` on first use.
    pub fn get_or_add(&mut self, gpu: &GpuContext, id: &str, make: impl FnOnce() -> C) -> C::Gpu {
        if let Some(existing) = self.get(id) {
            return existing;
        }
        log::debug!("Adding {id} to asset library");
        self.add(gpu, id, &make())
    }

    pub fn insert(&mut self, id: &str, asset: C::Gpu) {
        if let Some(mut previous) = self.items.insert(id.to_owned(), asset) {
            previous.release();
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.items.remove(id) {
            Some(mut asset) => {
                asset.release();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        for (_, mut asset) in self.items.drain() {
            asset.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct FakeGpu {
        valid: bool,
        releases: Rc<Cell<u32>>,
    }

    impl GpuAsset for FakeGpu {
        fn is_valid(&self) -> bool {
            self.valid
        }

        fn release(&mut self) {
            self.valid = false;
            self.releases.set(self.releases.get() + 1);
        }
    }

    struct FakeCpu;

    impl UploadToGpu for FakeCpu {
        type Gpu = FakeGpu;

        fn upload_to_gpu(&self, _gpu: &GpuContext, _label: &str) -> FakeGpu {
            unreachable!("library tests insert pre-built assets")
        }
    }

    fn fake(releases: &Rc<Cell<u32>>) -> FakeGpu {
        FakeGpu {
            valid: true,
            releases: releases.clone(),
        }
    }

    #[test]
    fn get_missing_returns_none() {
        let library: AssetLibrary<FakeCpu> = AssetLibrary::default();
        assert!(!library.exists("FullScreenQuad"));
        assert!(library.get("FullScreenQuad").is_none());
        assert!(library.is_empty());
    }

    #[test]
    fn insert_then_get_shares_the_asset() {
        let releases = Rc::new(Cell::new(0));
        let mut library: AssetLibrary<FakeCpu> = AssetLibrary::default();
        library.insert("PointLightMesh", fake(&releases));

        assert!(library.exists("PointLightMesh"));
        assert!(library.get("PointLightMesh").is_some_and(|a| a.is_valid()));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn replacing_and_removing_release_the_old_asset() {
        let releases = Rc::new(Cell::new(0));
        let mut library: AssetLibrary<FakeCpu> = AssetLibrary::default();
        library.insert("a", fake(&releases));
        library.insert("a", fake(&releases));
        assert_eq!(releases.get(), 1);

        assert!(library.remove("a"));
        assert!(!library.remove("a"));
        assert_eq!(releases.get(), 2);
        assert!(library.is_empty());
    }
}
