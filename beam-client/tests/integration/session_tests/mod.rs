mod test_media_denied_before_room;
mod test_media_end_closes_host;
mod test_unknown_room_is_terminal;
