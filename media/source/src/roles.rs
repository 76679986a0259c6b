/*!
    Stream role identification.

    Roles are recognized by codec and pixel format signature:

    | role  | codec | pixel format          |
    |-------|-------|-----------------------|
    | color | AV1   | 8-bit 4:2:0/4:2:2/4:4:4 |
    | alpha | FFV1  | gray8                 |
    | depth | PNG   | gray16be              |

    The first stream matching a signature wins; later duplicates are ignored.
*/

use media_types::{CodecId, Error, PixelFormat, Result, RoleSet, StreamInfo, StreamRole};

/**
    Returns the role a stream with this signature would play, if any.

    Color is matched on codec alone; its pixel format is checked by
    [`validate_roles`] so a 10-bit AV1 stream fails loudly instead of being
    ignored.
*/
pub fn classify_stream(codec_id: CodecId, pixel_format: PixelFormat) -> Option<StreamRole> {
    match (codec_id, pixel_format) {
        (CodecId::Av1, _) => Some(StreamRole::Color),
        (CodecId::Ffv1, PixelFormat::Gray8) => Some(StreamRole::Alpha),
        (CodecId::Png, PixelFormat::Gray16Be) => Some(StreamRole::Depth),
        _ => None,
    }
}

/**
    Assign roles to streams, keeping only the roles in `wanted`.

    Returns the set of roles that were found.
*/
pub fn assign_roles(streams: &mut [StreamInfo], wanted: RoleSet) -> RoleSet {
    let mut found = RoleSet::EMPTY;
    for stream in streams.iter_mut() {
        stream.role = None;
        let Some(role) = classify_stream(stream.codec_id, stream.pixel_format) else {
            continue;
        };
        if wanted.contains(role) && !found.contains(role) {
            found.insert(role);
            stream.role = Some(role);
            tracing::info!(
                index = stream.index,
                %role,
                width = stream.width,
                height = stream.height,
                "found stream"
            );
        }
    }
    found
}

/**
    Check that every required role has a stream and that the color stream
    uses a supported layout.
*/
pub fn validate_roles(streams: &[StreamInfo], required: RoleSet) -> Result<()> {
    let found: RoleSet = streams.iter().filter_map(|s| s.role).collect();
    let missing = required.difference(found);
    if !missing.is_empty() {
        return Err(Error::MissingStreams(missing));
    }

    let color = streams
        .iter()
        .find(|s| s.role == Some(StreamRole::Color));
    if let Some(color) = color {
        // Other means the container could not tell; the decoder checks each picture
        if color.pixel_format != PixelFormat::Other && color.pixel_format.chroma_layout().is_none()
        {
            return Err(Error::unsupported_format(format!(
                "color stream uses {:?}, only 8-bit 4:2:0, 4:2:2 and 4:4:4 are supported",
                color.pixel_format
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use media_types::Rational;

    use super::*;

    fn stream(index: usize, codec_id: CodecId, pixel_format: PixelFormat) -> StreamInfo {
        StreamInfo {
            index,
            codec_id,
            pixel_format,
            width: 640,
            height: 480,
            time_base: Rational::new(1, 1000),
            role: None,
        }
    }

    #[test]
    fn classify_signatures() {
        assert_eq!(
            classify_stream(CodecId::Av1, PixelFormat::Yuv420p),
            Some(StreamRole::Color)
        );
        assert_eq!(
            classify_stream(CodecId::Ffv1, PixelFormat::Gray8),
            Some(StreamRole::Alpha)
        );
        assert_eq!(
            classify_stream(CodecId::Png, PixelFormat::Gray16Be),
            Some(StreamRole::Depth)
        );
        assert_eq!(classify_stream(CodecId::Ffv1, PixelFormat::Gray16Be), None);
        assert_eq!(classify_stream(CodecId::Png, PixelFormat::Gray8), None);
        assert_eq!(classify_stream(CodecId::Other, PixelFormat::Yuv420p), None);
    }

    #[test]
    fn first_matching_stream_wins() {
        let mut streams = vec![
            stream(0, CodecId::Png, PixelFormat::Gray16Be),
            stream(1, CodecId::Av1, PixelFormat::Yuv420p),
            stream(2, CodecId::Av1, PixelFormat::Yuv420p),
            stream(3, CodecId::Ffv1, PixelFormat::Gray8),
        ];
        let found = assign_roles(&mut streams, RoleSet::ALL);

        assert_eq!(found, RoleSet::ALL);
        assert_eq!(streams[0].role, Some(StreamRole::Depth));
        assert_eq!(streams[1].role, Some(StreamRole::Color));
        assert_eq!(streams[2].role, None);
        assert_eq!(streams[3].role, Some(StreamRole::Alpha));
        assert!(validate_roles(&streams, RoleSet::ALL).is_ok());
    }

    #[test]
    fn unwanted_roles_are_left_unassigned() {
        let mut streams = vec![
            stream(0, CodecId::Av1, PixelFormat::Yuv444p),
            stream(1, CodecId::Ffv1, PixelFormat::Gray8),
        ];
        let found = assign_roles(&mut streams, RoleSet::COLOR);
        assert_eq!(found, RoleSet::COLOR);
        assert_eq!(streams[1].role, None);
    }

    #[test]
    fn missing_roles_are_reported() {
        let mut streams = vec![stream(0, CodecId::Av1, PixelFormat::Yuv420p)];
        assign_roles(&mut streams, RoleSet::ALL);

        match validate_roles(&streams, RoleSet::ALL) {
            Err(Error::MissingStreams(missing)) => {
                assert_eq!(missing, RoleSet::ALL.difference(RoleSet::COLOR));
            }
            other => panic!("expected missing streams, got {other:?}"),
        }
        assert!(validate_roles(&streams, RoleSet::COLOR).is_ok());
    }

    #[test]
    fn high_bit_depth_color_is_rejected() {
        let mut streams = vec![stream(0, CodecId::Av1, PixelFormat::Yuv420p10)];
        assign_roles(&mut streams, RoleSet::COLOR);
        assert!(matches!(
            validate_roles(&streams, RoleSet::COLOR),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn unknown_color_format_is_deferred() {
        let mut streams = vec![stream(0, CodecId::Av1, PixelFormat::Other)];
        assign_roles(&mut streams, RoleSet::COLOR);
        assert!(validate_roles(&streams, RoleSet::COLOR).is_ok());
    }
}
