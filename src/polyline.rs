use crate::entities::Coordinates;

/// Decodes an encoded polyline into its coordinate sequence.
///
/// The input is a base-32 varint stream: each character carries five
/// bits (char code minus 63), bit 0x20 marks a continuation, and each
/// decoded integer is a signed delta against the running latitude or
/// longitude sum, scaled by 1e5. Deltas come in (latitude, longitude)
/// pairs. Malformed trailing bytes are tolerated: only complete pairs
/// are emitted.
pub fn decode(encoded: &str) -> Vec<Coordinates> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::new();

    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let (dlat, after_lat) = match next_delta(bytes, index) {
            Some(value) => value,
            None => break,
        };
        let (dlng, after_lng) = match next_delta(bytes, after_lat) {
            Some(value) => value,
            None => break,
        };

        index = after_lng;
        lat += dlat;
        lng += dlng;

        coordinates.push(Coordinates {
            latitude: lat as f64 / 1e5,
            longitude: lng as f64 / 1e5,
        });
    }

    coordinates
}

/// One signed delta starting at `index`, with the index of the byte
/// after it. None when the value is cut off by end of input.
fn next_delta(bytes: &[u8], mut index: usize) -> Option<(i64, usize)> {
    let mut shift = 0u32;
    let mut result: i64 = 0;

    loop {
        let chunk = (*bytes.get(index)? as i64) - 63;
        index += 1;

        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }

        // no real polyline value needs this many chunks
        if shift > 60 {
            return None;
        }
    }

    let delta = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };

    Some((delta, index))
}

#[test]
fn decode_empty_string() {
    assert_eq!(decode(""), Vec::new());
}

#[test]
fn decode_reference_string() {
    let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@");

    assert_eq!(
        points,
        vec![
            Coordinates {
                latitude: 38.5,
                longitude: -120.2,
            },
            Coordinates {
                latitude: 40.7,
                longitude: -120.95,
            },
            Coordinates {
                latitude: 43.252,
                longitude: -126.453,
            },
        ]
    );
}

#[test]
fn decode_is_deterministic() {
    let encoded = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";
    assert_eq!(decode(encoded), decode(encoded));
}

#[test]
fn decode_truncated_input_drops_incomplete_pair() {
    let full = decode("_p~iF~ps|U_ulLnnqC");
    assert_eq!(full.len(), 2);

    // second longitude cut off mid-value: only the first pair survives
    let cut = decode("_p~iF~ps|U_ulLnn");
    assert_eq!(cut, full[..1].to_vec());

    // a lone latitude with no longitude yields nothing
    assert_eq!(decode("_p~iF"), Vec::new());
}

#[test]
fn decode_garbage_never_panics() {
    assert_eq!(decode("abc"), Vec::new());
}
