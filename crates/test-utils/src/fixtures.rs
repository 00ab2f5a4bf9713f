//! Known-good and known-bad AWS-X sentences.
//!
//! The sample is the example sentence from the station documentation;
//! its checksum is 0x56.

/// Documented sample sentence.
pub const SAMPLE_SENTENCE: &str = "$DPTAW,2003/03/19,04:48,AWSTEST,0027,10,53,1199,47,61,83,\
0,244,1,1531,16.0,15.0,17.0,102.0,0.0,0.0,0,13.0,84.9,82.0,99.0,E,13.1,*56";

/// Payload of [`SAMPLE_SENTENCE`] (between `$` and `*`).
pub const SAMPLE_PAYLOAD: &str = "DPTAW,2003/03/19,04:48,AWSTEST,0027,10,53,1199,47,61,83,\
0,244,1,1531,16.0,15.0,17.0,102.0,0.0,0.0,0,13.0,84.9,82.0,99.0,E,13.1,";

/// Checksum of [`SAMPLE_PAYLOAD`].
pub const SAMPLE_CHECKSUM: u8 = 0x56;

/// Station name carried by the sample.
pub const SAMPLE_STATION: &str = "AWSTEST";

/// The sample with its checksum off by one.
pub const BAD_CHECKSUM_SENTENCE: &str = "$DPTAW,2003/03/19,04:48,AWSTEST,0027,10,53,1199,47,61,83,\
0,244,1,1531,16.0,15.0,17.0,102.0,0.0,0.0,0,13.0,84.9,82.0,99.0,E,13.1,*57";

/// Number of comma-separated payload fields, header and trailing blank included.
pub const SAMPLE_FIELD_COUNT: usize = 29;

/// Lines that never frame.
pub mod malformed {
    pub const NO_START: &str = "DPTAW,2003/03/19,04:48*56";
    pub const NO_END: &str = "$DPTAW,2003/03/19,04:48";
    pub const SHORT_CHECKSUM: &str = "$DPTAW,2003/03/19*5";
    pub const NON_HEX_CHECKSUM: &str = "$DPTAW,2003/03/19*ZZ";
    pub const EMPTY: &str = "";
}
