use bytemuck::{Pod, Zeroable};

use crate::sprite::SpriteKey;

/// Per-frame shader parameters. Padded to 16 bytes for uniform layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteParams {
    pub flip_x: f32,
    pub _pad: [f32; 3],
}

impl SpriteParams {
    pub fn from_key(key: &SpriteKey) -> Self {
        Self {
            flip_x: if key.flip_x { 1.0 } else { 0.0 },
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteId;

    #[test]
    fn params_are_uniform_sized() {
        assert_eq!(std::mem::size_of::<SpriteParams>(), 16);
    }

    #[test]
    fn shader_params_match_rust_layout() {
        let module = naga::front::wgsl::parse_str(include_str!("shaders/sprite.wgsl"))
            .expect("sprite shader parses");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .expect("sprite shader validates");

        let mut layouter = naga::proc::Layouter::default();
        layouter.update(module.to_ctx()).expect("layout");
        let (handle, _) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("SpriteParams"))
            .expect("SpriteParams declared in shader");
        assert_eq!(
            layouter[handle].size as usize,
            std::mem::size_of::<SpriteParams>()
        );
    }

    #[test]
    fn flip_follows_key() {
        let key = SpriteKey {
            sprite: SpriteId::Walk,
            flip_x: true,
        };
        assert_eq!(SpriteParams::from_key(&key).flip_x, 1.0);
    }
}
