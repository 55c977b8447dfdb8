//! Resource caches
//!
//! Caches map a content-derived [`ResourceKey`] to the handle of the
//! resource created from that content, so identical descriptions never
//! create two backend resources. Each cache keeps a dense handle list for
//! iteration plus a key index into it; the two are updated together on
//! every insert and removal.
//!
//! Caches never evict. They grow for the lifetime of the device, and only
//! lose an entry when the device destroys the cached resource.

use crate::foundation::digest::ContentDigest;
use crate::render::handle::MaterialHandle;
use crate::render::resources::{Material, MaterialParameters, ShaderSource, TextureMetadata};
use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap};
use std::collections::HashMap;
use std::fmt;

/// Opaque key determined by resource content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Wrap a client-chosen key (texture path, material name, ...)
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of a program built from a vertex and a fragment source
    ///
    /// Both sources and all of their preprocessor definitions take part, so
    /// two configurations of the same source get different keys.
    pub fn for_program(vertex: &ShaderSource, fragment: &ShaderSource) -> Self {
        let mut digest = ContentDigest::new();
        for source in [vertex, fragment] {
            digest.update(source.stage.to_string()).update(&source.source);
            for (name, value) in &source.definitions {
                digest.update(name).update(value);
            }
        }
        Self(format!("program:{}", digest.finish()))
    }

    /// Key of an anonymous texture, derived from its metadata and pixels
    pub fn for_texture(metadata: &TextureMetadata, data: Option<&[u8]>) -> Self {
        let mut digest = ContentDigest::new();
        digest.update(format!("{metadata:?}"));
        if let Some(data) = data {
            digest.update(data);
        }
        Self(format!("texture:{}", digest.finish()))
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// What to do when a key is inserted while already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Keep the existing entry and ignore the new handle
    #[default]
    KeepFirst,
    /// Replace the existing entry with the new handle
    Overwrite,
}

/// Outcome of [`ResourceCache::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheInsert<H> {
    /// The key was new
    Inserted,
    /// The key was already present; `previous` is the handle it mapped to
    /// before the insert. Whether it still does depends on the policy.
    Collision {
        /// Handle previously stored under the key
        previous: H,
        /// Policy that was applied
        policy: CollisionPolicy,
    },
}

/// Key to handle cache with a dense handle list
#[derive(Debug, Clone)]
pub struct ResourceCache<H: Key> {
    name: &'static str,
    handles: Vec<H>,
    keys: Vec<ResourceKey>,
    lookup: HashMap<ResourceKey, usize>,
    policy: CollisionPolicy,
}

impl<H: Key> ResourceCache<H> {
    /// Create an empty cache. `name` only appears in log output.
    pub fn new(name: &'static str, policy: CollisionPolicy) -> Self {
        Self::with_capacity(name, 0, policy)
    }

    /// Create an empty cache with room for `capacity` entries
    pub fn with_capacity(name: &'static str, capacity: usize, policy: CollisionPolicy) -> Self {
        Self {
            name,
            handles: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
            policy,
        }
    }

    /// Whether a handle is cached under `key`
    pub fn exists(&self, key: &ResourceKey) -> bool {
        self.lookup.contains_key(key)
    }

    /// Handle cached under `key`
    ///
    /// Callers are expected to have checked [`exists`](Self::exists) or to
    /// have inserted the key themselves; `None` means that contract was
    /// broken.
    pub fn get(&self, key: &ResourceKey) -> Option<H> {
        self.lookup.get(key).map(|&index| self.handles[index])
    }

    /// Cache `handle` under `key`
    ///
    /// A second insert of the same key is resolved by the cache's
    /// [`CollisionPolicy`] and logged as a warning.
    pub fn insert(&mut self, handle: H, key: ResourceKey) -> CacheInsert<H> {
        if let Some(&index) = self.lookup.get(&key) {
            let previous = self.handles[index];
            log::warn!(
                "{} cache key collision on '{}' ({:?} already cached, policy {:?})",
                self.name,
                key,
                previous,
                self.policy
            );
            if self.policy == CollisionPolicy::Overwrite {
                self.handles[index] = handle;
            }
            return CacheInsert::Collision { previous, policy: self.policy };
        }

        let index = self.handles.len();
        self.handles.push(handle);
        self.keys.push(key.clone());
        self.lookup.insert(key, index);
        log::trace!("{} cache: inserted {:?} ({} entries)", self.name, handle, self.handles.len());
        CacheInsert::Inserted
    }

    /// Drop every entry pointing at `handle`, returning the removed keys
    pub fn forget(&mut self, handle: H) -> Vec<ResourceKey> {
        let mut removed = Vec::new();
        let mut index = 0;
        while index < self.handles.len() {
            if self.handles[index] != handle {
                index += 1;
                continue;
            }

            let key = self.keys.swap_remove(index);
            self.handles.swap_remove(index);
            self.lookup.remove(&key);
            // The former last entry now lives at `index`.
            if let Some(moved) = self.keys.get(index) {
                self.lookup.insert(moved.clone(), index);
            }
            removed.push(key);
        }
        removed
    }

    /// Cached handles in insertion order (until the first removal)
    pub fn handles(&self) -> &[H] {
        &self.handles
    }

    /// Iterate `(key, handle)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, H)> + '_ {
        self.keys.iter().zip(self.handles.iter().copied())
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Collision policy in effect
    pub const fn policy(&self) -> CollisionPolicy {
        self.policy
    }
}

/// Texture cache keyed by texture id
pub type TextureCache = ResourceCache<crate::render::handle::TextureHandle>;

/// Program cache keyed by shader sources plus definitions
pub type ProgramCache = ResourceCache<crate::render::handle::ProgramHandle>;

/// Materials stored by value, optionally indexed by key
#[derive(Debug, Clone)]
pub struct MaterialCache {
    materials: SlotMap<MaterialHandle, Material>,
    keyed: ResourceCache<MaterialHandle>,
}

impl MaterialCache {
    /// Create an empty material cache
    pub fn with_capacity(capacity: usize, policy: CollisionPolicy) -> Self {
        Self {
            materials: SlotMap::with_capacity_and_key(capacity),
            keyed: ResourceCache::with_capacity("material", capacity, policy),
        }
    }

    /// Store a material and return its handle
    pub fn add(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    /// Store a material under `key`
    ///
    /// Under [`CollisionPolicy::KeepFirst`] an existing key wins and the new
    /// material is not stored; the existing handle is returned.
    pub fn add_keyed(&mut self, key: ResourceKey, material: Material) -> MaterialHandle {
        if self.keyed.policy() == CollisionPolicy::KeepFirst {
            if let Some(existing) = self.keyed.get(&key) {
                log::warn!("material cache key collision on '{key}', keeping {existing:?}");
                return existing;
            }
        }
        let handle = self.materials.insert(material);
        self.keyed.insert(handle, key);
        handle
    }

    /// Policy applied when a key is stored twice
    pub const fn policy(&self) -> CollisionPolicy {
        self.keyed.policy()
    }

    /// Whether a material is stored under `key`
    pub fn exists(&self, key: &ResourceKey) -> bool {
        self.keyed.exists(key)
    }

    /// Handle of the material stored under `key`
    pub fn find(&self, key: &ResourceKey) -> Option<MaterialHandle> {
        self.keyed.get(key)
    }

    /// Material behind a handle; `None` for stale or null handles
    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Mutable access to a material
    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }

    /// Whether `handle` refers to a live material
    pub fn contains(&self, handle: MaterialHandle) -> bool {
        self.materials.contains_key(handle)
    }

    /// Merge parameters into a stored material. Returns false for a stale handle.
    pub fn apply_parameters(&mut self, handle: MaterialHandle, parameters: &MaterialParameters) -> bool {
        match self.materials.get_mut(handle) {
            Some(material) => {
                material.parameters.merge(parameters);
                true
            }
            None => false,
        }
    }

    /// Remove a material and any key pointing at it
    pub fn remove(&mut self, handle: MaterialHandle) -> Option<Material> {
        let material = self.materials.remove(handle)?;
        self.keyed.forget(handle);
        Some(material)
    }

    /// Iterate stored materials
    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials.iter()
    }

    /// Number of stored materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True when no material is stored
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
