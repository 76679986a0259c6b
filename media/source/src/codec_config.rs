/*!
    Opaque codec configuration for passing to decoders.
*/

use ffmpeg_next::codec;

use media_types::{Rational, StreamRole};

/**
    Codec parameters of one role-tagged stream.

    Holds an owned copy of the parameters, detached from the format context,
    so it can be moved to whichever thread builds the decoders.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
    role: StreamRole,
    time_base: Rational,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters, role: StreamRole, time_base: Rational) -> Self {
        Self {
            parameters,
            role,
            time_base,
        }
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn parameters(&self) -> &codec::Parameters {
        &self.parameters
    }

    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl Clone for CodecConfig {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
            role: self.role,
            time_base: self.time_base,
        }
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("role", &self.role)
            .field("codec_id", &self.parameters.id())
            .finish_non_exhaustive()
    }
}
