//! Mask decoder registry.
//!
//! Maps `(resource type, action)` to the bit the action owns in a
//! [`PermissionMask`]. Populated once at bootstrap, read-only afterwards.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{Error, Result};
use crate::mask::{DEFAULT_ACTIONS, MaskBit, MaskDecoder, PermissionMask, USABLE_BITS};

/// Decoders of every registered resource type.
#[derive(Debug, Default, Clone)]
pub struct MaskDecoderRegistry {
    types: HashMap<String, Vec<MaskDecoder>>,
}

impl MaskDecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type with the default action set.
    ///
    /// Registering a type twice leaves the existing decoders untouched.
    pub fn register_type(&mut self, type_name: &str) {
        if self.types.contains_key(type_name) {
            return;
        }
        let decoders = DEFAULT_ACTIONS
            .iter()
            .map(|(action, bit)| MaskDecoder::new(type_name, action, *bit))
            .collect();
        self.types.insert(type_name.to_string(), decoders);
        debug!(resource_type = type_name, "Registered resource type");
    }

    /// Add a custom action to `type_name`, using the lowest free bit.
    pub fn add_action(
        &mut self,
        type_name: &str,
        action: &str,
        icons: Option<(&str, &str)>,
    ) -> Result<MaskBit> {
        let decoders = self.types.entry(type_name.to_string()).or_default();
        let action = action.to_lowercase();
        if decoders.iter().any(|d| d.action == action) {
            return Err(Error::Decoder(format!(
                "action '{action}' already exists for the type '{type_name}'"
            )));
        }

        let used = decoders
            .iter()
            .fold(0u32, |acc, decoder| acc | decoder.bit.value());
        let index = (0..USABLE_BITS)
            .find(|index| used & (1 << index) == 0)
            .ok_or_else(|| {
                Error::Decoder(format!("no free permission bit left for the type '{type_name}'"))
            })?;
        let bit = MaskBit::at(index)?;

        let mut decoder = MaskDecoder::new(type_name, &action, bit);
        if let Some((granted, denied)) = icons {
            decoder = decoder.with_icons(granted, denied);
        }
        decoders.push(decoder);
        decoders.sort_by_key(|d| d.bit);

        debug!(resource_type = type_name, action, bit = %bit, "Added custom action");
        Ok(bit)
    }

    /// Register a decoder with an explicit bit.
    ///
    /// Fails when the action already exists for the type or the bit is
    /// already owned by another action of the same type.
    pub fn insert(&mut self, decoder: MaskDecoder) -> Result<()> {
        let decoders = self.types.entry(decoder.resource_type.clone()).or_default();
        if let Some(existing) = decoders
            .iter()
            .find(|d| d.action == decoder.action || d.bit == decoder.bit)
        {
            return Err(Error::Decoder(format!(
                "decoder '{}' (bit {}) of type '{}' conflicts with '{}' (bit {})",
                decoder.action, decoder.bit, decoder.resource_type, existing.action, existing.bit
            )));
        }
        decoders.push(decoder);
        decoders.sort_by_key(|d| d.bit);
        Ok(())
    }

    /// Look up the decoder of `action` (case-insensitive) for `type_name`.
    pub fn decoder(&self, type_name: &str, action: &str) -> Option<&MaskDecoder> {
        self.types
            .get(type_name)?
            .iter()
            .find(|d| d.action.eq_ignore_ascii_case(action))
    }

    /// Whether `type_name` has been registered.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Decoders of `type_name`, ordered by bit.
    pub fn decoders(&self, type_name: &str) -> &[MaskDecoder] {
        self.types.get(type_name).map_or(&[], Vec::as_slice)
    }

    /// `(action, bit)` pairs of `type_name`, ordered by bit.
    pub fn permission_map(&self, type_name: &str) -> Vec<(&str, MaskBit)> {
        self.decoders(type_name)
            .iter()
            .map(|d| (d.action.as_str(), d.bit))
            .collect()
    }

    /// Expand `mask` into action -> granted for every action of `type_name`.
    pub fn decode_mask(&self, mask: PermissionMask, type_name: &str) -> BTreeMap<String, bool> {
        self.decoders(type_name)
            .iter()
            .map(|d| (d.action.clone(), mask.grants(d.bit)))
            .collect()
    }

    /// OR together the bits of `actions` for `type_name`.
    pub fn encode_mask<S: AsRef<str>>(
        &self,
        actions: &[S],
        type_name: &str,
    ) -> Result<PermissionMask> {
        actions.iter().try_fold(PermissionMask::EMPTY, |mask, action| {
            let action = action.as_ref();
            self.decoder(type_name, action)
                .map(|d| mask.with(d.bit))
                .ok_or_else(|| {
                    Error::Decoder(format!(
                        "the permission {action} does not exist for the type {type_name}"
                    ))
                })
        })
    }
}
