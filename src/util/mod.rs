/*!
 This module contains shared helpers used by the format codecs.
*/

pub mod dates;
pub mod stream;
