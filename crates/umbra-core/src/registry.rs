//! Registry of structures and lights.
//!
//! Both live in generational slot tables. Handles stay valid for the
//! lifetime of the slot; once an entry is removed its handle resolves to
//! `None` even if the slot is reused.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, UmbraError};
use crate::light::Light;
use crate::structure::Structure;

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            /// Slot index, stable while the entry is alive.
            pub fn index(self) -> u32 {
                self.index
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}v{}", $label, self.index, self.generation)
            }
        }

        impl $name {
            fn from_key(key: SlotKey) -> Self {
                Self {
                    index: key.index,
                    generation: key.generation,
                }
            }

            fn key(self) -> SlotKey {
                SlotKey {
                    index: self.index,
                    generation: self.generation,
                }
            }
        }
    };
}

handle_type!(
    /// Handle to a registered structure.
    StructureId,
    "structure"
);
handle_type!(
    /// Handle to a registered light.
    LightId,
    "light"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotKey {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A vector of slots with generation counters and a free list.
struct SlotTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> SlotTable<T> {
    fn insert(&mut self, value: T) -> SlotKey {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            SlotKey {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            SlotKey {
                index,
                generation: 0,
            }
        }
    }

    fn get(&self, key: SlotKey) -> Option<&T> {
        let slot = self.slots.get(key.index as usize)?;
        (slot.generation == key.generation)
            .then_some(slot.value.as_ref())
            .flatten()
    }

    fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation == key.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        Some(value)
    }

    fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            Some((
                SlotKey {
                    index: u32::try_from(index).ok()?,
                    generation: slot.generation,
                },
                value,
            ))
        })
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                if let Ok(index) = u32::try_from(index) {
                    self.free.push(index);
                }
            }
        }
    }
}

/// A light with its registered name.
#[derive(Debug, Clone)]
pub struct NamedLight {
    /// Unique name of the light.
    pub name: String,
    /// The light itself.
    pub light: Light,
}

/// Registry for managing all structures and lights.
#[derive(Default)]
pub struct Registry {
    structures: SlotTable<Box<dyn Structure>>,
    lights: SlotTable<NamedLight>,
    names: HashMap<String, StructureId>,
    light_names: HashMap<String, LightId>,
    /// Structures that expose a shadow-occluder capability, in registration
    /// order.
    occluders: Vec<StructureId>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structure with the registry.
    ///
    /// Returns an error if a structure with the same name already exists.
    pub fn register(&mut self, structure: Box<dyn Structure>) -> Result<StructureId> {
        let name = structure.name().to_string();
        if self.names.contains_key(&name) {
            return Err(UmbraError::StructureExists(name));
        }
        let casts_shadows = structure.as_occluder().is_some();
        let id = StructureId::from_key(self.structures.insert(structure));
        if casts_shadows {
            self.occluders.push(id);
        }
        self.names.insert(name, id);
        Ok(id)
    }

    /// Registers a light. Re-using a name replaces the mapping but keeps
    /// the old light alive under its handle.
    pub fn register_light(&mut self, name: impl Into<String>, light: Light) -> LightId {
        let name = name.into();
        let id = LightId::from_key(self.lights.insert(NamedLight {
            name: name.clone(),
            light,
        }));
        self.light_names.insert(name, id);
        id
    }

    /// Gets a reference to a structure.
    pub fn get(&self, id: StructureId) -> Option<&dyn Structure> {
        self.structures.get(id.key()).map(|s| s.as_ref())
    }

    /// Gets a mutable reference to a structure.
    pub fn get_mut(&mut self, id: StructureId) -> Option<&mut Box<dyn Structure>> {
        self.structures.get_mut(id.key())
    }

    /// Looks up a structure handle by name.
    pub fn find(&self, name: &str) -> Option<StructureId> {
        self.names.get(name).copied()
    }

    /// Gets a light.
    pub fn light(&self, id: LightId) -> Option<&NamedLight> {
        self.lights.get(id.key())
    }

    /// Gets a light mutably.
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut NamedLight> {
        self.lights.get_mut(id.key())
    }

    /// Looks up a light handle by name.
    pub fn find_light(&self, name: &str) -> Option<LightId> {
        self.light_names.get(name).copied()
    }

    /// Removes a structure.
    pub fn remove(&mut self, id: StructureId) -> Option<Box<dyn Structure>> {
        let structure = self.structures.remove(id.key())?;
        self.names.remove(structure.name());
        self.occluders.retain(|&o| o != id);
        Some(structure)
    }

    /// Removes a light.
    pub fn remove_light(&mut self, id: LightId) -> Option<NamedLight> {
        let light = self.lights.remove(id.key())?;
        if self.light_names.get(&light.name) == Some(&id) {
            self.light_names.remove(&light.name);
        }
        Some(light)
    }

    /// Re-evaluates the occluder capability of one structure, after a change
    /// that may switch shadow casting on or off.
    pub fn refresh_occluder(&mut self, id: StructureId) {
        let casts = self
            .get(id)
            .is_some_and(|structure| structure.as_occluder().is_some());
        let listed = self.occluders.contains(&id);
        if casts && !listed {
            self.occluders.push(id);
        } else if !casts && listed {
            self.occluders.retain(|&o| o != id);
        }
    }

    /// Removes all structures and lights from the registry.
    pub fn clear(&mut self) {
        self.structures.clear();
        self.lights.clear();
        self.names.clear();
        self.light_names.clear();
        self.occluders.clear();
    }

    /// Returns an iterator over all structures.
    pub fn iter(&self) -> impl Iterator<Item = (StructureId, &dyn Structure)> {
        self.structures
            .iter()
            .map(|(key, s)| (StructureId::from_key(key), s.as_ref()))
    }

    /// Returns an iterator over all lights.
    pub fn lights(&self) -> impl Iterator<Item = (LightId, &NamedLight)> {
        self.lights.iter().map(|(key, l)| (LightId::from_key(key), l))
    }

    /// Handles of the structures that cast shadows.
    pub fn occluders(&self) -> &[StructureId] {
        &self.occluders
    }

    /// Returns the total number of registered structures.
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Returns true if the registry holds no structures.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of registered lights.
    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }
}
